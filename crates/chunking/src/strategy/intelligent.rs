//! Structure-aware chunking.
//!
//! The text is parsed into blocks (headings, fenced code, tables, lists,
//! paragraphs). Code, tables and lists stay whole unless they exceed
//! [`ATOMIC_HARD_SPLIT_FACTOR`] times `max_chunk_size`. Every chunk carries the
//! heading breadcrumb it falls under.

use super::sentence::{pack, Oversized, PackMode};
use super::{fixed_windows, merge_undersized_tail, Segment, SegmentContext, RECOVERY_PENALTY};
use crate::budget::{estimate_tokens, Budget};
use crate::classify::{
    detect_document_domain, heading_level, heading_title, is_code_fence, is_list_item,
    is_table_line, DEFAULT_TECHNICAL_KEYWORDS,
};
use crate::language::find_section_starts;
use crate::offsets::CharOffsets;
use crate::types::StructuralRole;
use rechunk_core::ChunkError;
use std::collections::HashSet;
use std::ops::Range;

/// Atomic blocks above `max * ATOMIC_HARD_SPLIT_FACTOR` tokens are cut.
pub const ATOMIC_HARD_SPLIT_FACTOR: usize = 4;

const BREADCRUMB_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, PartialEq)]
enum BlockKind {
    Heading { level: u8, title: String },
    Code,
    Table,
    List,
    Text,
}

#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    range: Range<usize>,
    /// A blank line or fence close ended this block.
    closed: bool,
}

impl Block {
    fn new(kind: BlockKind, range: Range<usize>) -> Self {
        let closed = matches!(kind, BlockKind::Heading { .. });
        Self {
            kind,
            range,
            closed,
        }
    }

    fn role(&self) -> StructuralRole {
        match self.kind {
            BlockKind::Heading { .. } => StructuralRole::Header,
            BlockKind::Code => StructuralRole::CodeBlock,
            BlockKind::Table => StructuralRole::Table,
            BlockKind::List => StructuralRole::List,
            BlockKind::Text => StructuralRole::Content,
        }
    }

    fn accepts(&self, kind: &BlockKind, line: &str) -> bool {
        if self.closed {
            return false;
        }
        match (&self.kind, kind) {
            (BlockKind::Table, BlockKind::Table)
            | (BlockKind::List, BlockKind::List)
            | (BlockKind::Text, BlockKind::Text) => true,
            // Indented continuation of a list item
            (BlockKind::List, BlockKind::Text) => line.starts_with([' ', '\t']),
            _ => false,
        }
    }
}

pub(super) fn segment(cx: &SegmentContext<'_>) -> Result<Vec<Segment>, ChunkError> {
    let text = cx.text();
    let budget = if cx.options.flag("use_domain_presets") {
        let domain = detect_document_domain(text, DEFAULT_TECHNICAL_KEYWORDS);
        tracing::debug!(domain = domain.as_str(), "Applying domain size preset");
        Budget::from_options(&cx.options.clone().with_domain_preset(domain))
    } else {
        cx.budget()
    };

    let blocks = parse_blocks(cx);
    let assembler = Assembler {
        cx,
        budget,
        preserve_structure: cx.options.preserve_structure,
        out: Vec::new(),
        open: None,
        trail: Vec::new(),
    };
    let segments = assembler.run(blocks)?;

    Ok(merge_undersized_tail(segments, text, budget.min))
}

fn parse_blocks(cx: &SegmentContext<'_>) -> Vec<Block> {
    let text = cx.text();
    let section_starts: HashSet<usize> = find_section_starts(text, cx.profile).into_iter().collect();

    let mut blocks: Vec<Block> = Vec::new();
    let mut fence: Option<&str> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let range = offset..offset + line.len();
        offset = range.end;
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            if let Some(block) = blocks.last_mut() {
                block.range.end = range.end;
                let rest = trimmed.trim_start_matches(marker.chars().next().unwrap_or('`'));
                if trimmed.starts_with(marker) && rest.trim().is_empty() {
                    block.closed = true;
                    fence = None;
                }
            }
            continue;
        }

        if trimmed.trim().is_empty() {
            if let Some(block) = blocks.last_mut() {
                block.range.end = range.end;
                block.closed = true;
            }
            continue;
        }

        if is_code_fence(line) {
            fence = Some(if trimmed.starts_with("~~~") { "~~~" } else { "```" });
            blocks.push(Block::new(BlockKind::Code, range));
            continue;
        }

        let marker_start = range.start + (line.len() - trimmed.len());
        let heading = heading_level(line).or_else(|| section_starts.contains(&marker_start).then_some(1));
        if let Some(level) = heading {
            let title = match heading_title(line) {
                title if title.is_empty() => line.trim().to_string(),
                title => title,
            };
            blocks.push(Block::new(BlockKind::Heading { level, title }, range));
            continue;
        }

        let kind = if is_table_line(line) {
            BlockKind::Table
        } else if is_list_item(line) {
            BlockKind::List
        } else {
            BlockKind::Text
        };

        match blocks.last_mut() {
            Some(block) if block.accepts(&kind, line) => block.range.end = range.end,
            _ => blocks.push(Block::new(kind, range)),
        }
    }

    if let Some(first) = blocks.first_mut() {
        first.range.start = 0;
    }
    if let Some(last) = blocks.last_mut() {
        last.range.end = text.len();
    }

    apply_span_hints(cx, &mut blocks);
    blocks
}

/// Upstream `code_spans` / `table_spans` hints turn plain text blocks they
/// contain into atomic blocks.
fn apply_span_hints(cx: &SegmentContext<'_>, blocks: &mut [Block]) {
    let code = cx.content.hint_char_spans("code_spans");
    let tables = cx.content.hint_char_spans("table_spans");
    if code.is_empty() && tables.is_empty() {
        return;
    }

    let offsets = CharOffsets::new(cx.text());
    let to_bytes = |spans: Vec<(usize, usize)>| -> Vec<Range<usize>> {
        spans
            .into_iter()
            .map(|(start, end)| offsets.to_byte(start)..offsets.to_byte(end))
            .collect()
    };
    let code = to_bytes(code);
    let tables = to_bytes(tables);
    let text = cx.text();

    for block in blocks.iter_mut().filter(|b| b.kind == BlockKind::Text) {
        // Compare on the block's content, ignoring its trailing blank lines.
        let content_end = block.range.start + text[block.range.clone()].trim_end().len();
        let inside = |span: &Range<usize>| span.start <= block.range.start && content_end <= span.end;

        if code.iter().any(inside) {
            block.kind = BlockKind::Code;
        } else if tables.iter().any(inside) {
            block.kind = BlockKind::Table;
        }
    }
}

/// Chunk under construction.
struct Open {
    range: Range<usize>,
    tokens: usize,
    parts: Vec<(StructuralRole, usize)>,
    header: Option<String>,
}

impl Open {
    fn only_headings(&self) -> bool {
        self.parts.iter().all(|(role, _)| *role == StructuralRole::Header)
    }

    fn add(&mut self, block: &Block, tokens: usize) {
        self.range.end = block.range.end;
        self.tokens += tokens;
        self.parts.push((block.role(), tokens));
    }

    /// Role of the largest block; the first wins a tie.
    fn role(&self) -> StructuralRole {
        let mut best: Option<(StructuralRole, usize)> = None;
        for &(role, tokens) in &self.parts {
            if best.map_or(true, |(_, t)| tokens > t) {
                best = Some((role, tokens));
            }
        }
        best.map_or(StructuralRole::Content, |(role, _)| role)
    }

    fn into_segment(self) -> Segment {
        let role = self.role();
        Segment::new(self.range).with_role(role).with_header(self.header)
    }
}

struct Assembler<'c, 'a> {
    cx: &'c SegmentContext<'a>,
    budget: Budget,
    preserve_structure: bool,
    out: Vec<Segment>,
    open: Option<Open>,
    /// Enclosing headings, outermost first
    trail: Vec<(u8, String)>,
}

impl Assembler<'_, '_> {
    fn run(mut self, blocks: Vec<Block>) -> Result<Vec<Segment>, ChunkError> {
        for block in blocks {
            self.cx.check_cancelled()?;
            let tokens = estimate_tokens(&self.cx.text()[block.range.clone()]);

            match &block.kind {
                BlockKind::Heading { level, title } => {
                    self.enter_heading(*level, title.clone());
                    self.heading(&block, tokens)?;
                }
                _ if block.role().is_atomic() => self.atomic(&block, tokens)?,
                _ => self.text(&block, tokens)?,
            }
        }

        self.flush();
        Ok(self.out)
    }

    fn enter_heading(&mut self, level: u8, title: String) {
        while self.trail.last().is_some_and(|(l, _)| *l >= level) {
            self.trail.pop();
        }
        self.trail.push((level, title));
    }

    fn breadcrumb(&self) -> Option<String> {
        if self.trail.is_empty() {
            return None;
        }
        Some(
            self.trail
                .iter()
                .map(|(_, title)| title.as_str())
                .collect::<Vec<_>>()
                .join(BREADCRUMB_SEPARATOR),
        )
    }

    fn start(&mut self, block: &Block, tokens: usize) {
        self.open = Some(Open {
            range: block.range.clone(),
            tokens,
            parts: vec![(block.role(), tokens)],
            header: self.breadcrumb(),
        });
    }

    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            self.out.push(open.into_segment());
        }
    }

    fn fits(&self, tokens: usize) -> bool {
        self.open
            .as_ref()
            .is_some_and(|open| open.tokens + tokens <= self.budget.max)
    }

    fn append(&mut self, block: &Block, tokens: usize) {
        if let Some(open) = self.open.as_mut() {
            open.add(block, tokens);
        }
    }

    fn heading(&mut self, block: &Block, tokens: usize) -> Result<(), ChunkError> {
        if tokens > self.budget.max {
            self.flush();
            tracing::warn!(tokens, max = self.budget.max, "Heading longer than max_chunk_size, splitting");
            let message = format!("heading of {tokens} tokens exceeds max_chunk_size; split into windows");
            let header = self.breadcrumb();
            let pieces = fixed_windows(self.cx.text(), block.range.clone(), &self.budget, false, self.cx.cancel)?;
            self.out.extend(pieces.into_iter().map(|piece| {
                piece
                    .with_role(StructuralRole::Header)
                    .with_header(header.clone())
                    .warn(message.clone(), RECOVERY_PENALTY)
            }));
            return Ok(());
        }

        let stacked = self.open.as_ref().is_some_and(|open| open.only_headings());

        if stacked && self.fits(tokens) {
            // "# Guide" directly followed by "## Install": one breadcrumb
            self.append(block, tokens);
            let header = self.breadcrumb();
            if let Some(open) = self.open.as_mut() {
                open.header = header;
            }
        } else if self.preserve_structure || !self.fits(tokens) {
            self.flush();
            self.start(block, tokens);
        } else {
            self.append(block, tokens);
        }
        Ok(())
    }

    fn atomic(&mut self, block: &Block, tokens: usize) -> Result<(), ChunkError> {
        if self.fits(tokens) {
            self.append(block, tokens);
            return Ok(());
        }

        let hard_limit = self.budget.max * ATOMIC_HARD_SPLIT_FACTOR;
        let lead = self.open.take();

        match lead {
            // Keep a heading with the block it introduces.
            Some(open) if open.only_headings() && open.tokens + tokens <= hard_limit => {
                self.out.push(
                    Segment::new(open.range.start..block.range.end)
                        .with_role(block.role())
                        .with_header(open.header)
                        .atomic(),
                );
            }
            lead => {
                if let Some(open) = lead {
                    self.out.push(open.into_segment());
                }
                self.emit_atomic(block, tokens, hard_limit)?;
            }
        }
        Ok(())
    }

    fn emit_atomic(&mut self, block: &Block, tokens: usize, hard_limit: usize) -> Result<(), ChunkError> {
        let role = block.role();
        let header = self.breadcrumb();

        if tokens <= hard_limit {
            self.out.push(
                Segment::new(block.range.clone())
                    .with_role(role)
                    .with_header(header)
                    .atomic(),
            );
            return Ok(());
        }

        tracing::warn!(
            role = role.as_str(),
            tokens,
            hard_limit,
            "Atomic block too large, hard-splitting"
        );
        let message = format!(
            "{} block of {tokens} tokens exceeds {ATOMIC_HARD_SPLIT_FACTOR}x max_chunk_size; hard-split",
            role.as_str()
        );
        let pieces = fixed_windows(self.cx.text(), block.range.clone(), &self.budget, false, self.cx.cancel)?;
        self.out.extend(pieces.into_iter().map(|piece| {
            piece
                .with_role(role)
                .with_header(header.clone())
                .atomic()
                .warn(message.clone(), RECOVERY_PENALTY)
        }));
        Ok(())
    }

    fn text(&mut self, block: &Block, tokens: usize) -> Result<(), ChunkError> {
        if tokens <= self.budget.max {
            if self.fits(tokens) {
                self.append(block, tokens);
            } else {
                self.flush();
                self.start(block, tokens);
            }
            return Ok(());
        }

        // Oversized paragraph: sentence-pack it, pulling in a leading heading.
        let start = match self.open.take() {
            Some(open) if open.only_headings() => open.range.start,
            Some(open) => {
                self.out.push(open.into_segment());
                block.range.start
            }
            None => block.range.start,
        };

        let header = self.breadcrumb();
        let pieces = pack(
            self.cx,
            start..block.range.end,
            &self.budget,
            PackMode::Strict,
            Oversized::FixedSplit,
            "intelligent",
        )?;
        self.out
            .extend(pieces.into_iter().map(|piece| piece.with_header(header.clone())));
        Ok(())
    }
}
