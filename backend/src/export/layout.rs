//! Flowing layout shared by every paged export.
//!
//! A document is flattened into blocks of fixed height; pagination walks
//! the blocks with a vertical cursor and starts a new page when the next
//! block would cross the page-height budget.

use crate::export::ReportDocument;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Subtitle(String),
    Heading(String),
    Field { label: String, value: String },
    Spacer,
}

impl Block {
    /// Height in millimetres
    pub fn height(&self) -> f32 {
        match self {
            Block::Title(_) => 12.0,
            Block::Subtitle(_) => 7.0,
            Block::Heading(_) => 10.0,
            Block::Field { .. } => 6.0,
            Block::Spacer => 4.0,
        }
    }

    /// Headings are never left alone at the bottom of a page
    fn keeps_with_next(&self) -> bool {
        matches!(self, Block::Heading(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub block: Block,
    /// Offset from the top of the content area, in millimetres
    pub top: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    pub blocks: Vec<PlacedBlock>,
}

impl Page {
    pub fn footer_label(&self, total: usize) -> String {
        format!("Página {} de {}", self.number, total)
    }

    /// Height used by the blocks on this page
    pub fn used_height(&self) -> f32 {
        self.blocks
            .last()
            .map(|b| b.top + b.block.height())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlowLayout {
    content_height: f32,
}

impl FlowLayout {
    pub fn new(content_height: f32) -> Self {
        Self { content_height }
    }

    /// Distribute blocks over pages. Always returns at least one page.
    pub fn paginate(&self, blocks: Vec<Block>) -> Vec<Page> {
        let mut pages: Vec<Vec<PlacedBlock>> = Vec::new();
        let mut current: Vec<PlacedBlock> = Vec::new();
        let mut cursor = 0.0_f32;

        let mut blocks = blocks.into_iter().peekable();
        while let Some(block) = blocks.next() {
            let height = block.height();
            let mut needed = height;
            if block.keeps_with_next() {
                if let Some(next) = blocks.peek() {
                    needed += next.height();
                }
            }

            if !current.is_empty() && cursor + needed > self.content_height {
                pages.push(std::mem::take(&mut current));
                cursor = 0.0;
            }
            if current.is_empty() && block == Block::Spacer {
                continue;
            }

            current.push(PlacedBlock { block, top: cursor });
            cursor += height;
        }

        if !current.is_empty() || pages.is_empty() {
            pages.push(current);
        }

        pages
            .into_iter()
            .enumerate()
            .map(|(i, blocks)| Page {
                number: i + 1,
                blocks,
            })
            .collect()
    }
}

/// Flatten a report document into layout blocks
pub fn document_blocks(document: &ReportDocument) -> Vec<Block> {
    let mut blocks = vec![
        Block::Title(document.title.clone()),
        Block::Subtitle(document.generated_label()),
    ];
    if let Some(filter) = &document.filter_description {
        blocks.push(Block::Subtitle(filter.clone()));
    }

    blocks.push(Block::Spacer);
    blocks.push(Block::Heading("Resumen General".to_string()));
    blocks.extend(document.summary.iter().map(|f| Block::Field {
        label: f.label.clone(),
        value: f.value.clone(),
    }));

    for section in &document.sections {
        blocks.push(Block::Spacer);
        blocks.push(Block::Heading(section.heading.clone()));
        blocks.extend(section.fields.iter().map(|f| Block::Field {
            label: f.label.clone(),
            value: f.value.clone(),
        }));
    }

    blocks
}
