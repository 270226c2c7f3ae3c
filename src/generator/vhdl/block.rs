//! Structured text output.
//!
//! Emitted VHDL is built from [`Line`]s (token sequences), [`Block`]s
//! (lines at an indent level, rendered with per-column alignment) and
//! [`MultiBlock`]s (block sequences). Tokens carry their own separators
//! (` : `, ` => `), so rendering just pads token columns and
//! concatenates.
//!
//! [`Line`]: ./struct.Line.html
//! [`Block`]: ./struct.Block.html
//! [`MultiBlock`]: ./struct.MultiBlock.html

use std::fmt;

/// Spaces per indent level.
const INDENT: usize = 2;

/// A sequence of tokens forming one output line.
#[derive(Debug, Clone, Default)]
pub struct Line {
    tokens: Vec<String>,
}

impl Line {
    /// Construct an empty line.
    pub fn new() -> Line {
        Line::default()
    }

    /// Construct a line holding one token.
    pub fn from(token: impl Into<String>) -> Line {
        let mut line = Line::new();
        line.push(token);
        line
    }

    /// Append a token.
    pub fn push(&mut self, token: impl Into<String>) -> &mut Line {
        self.tokens.push(token.into());
        self
    }

    /// Append text to the last token, without starting a new column.
    pub fn append(&mut self, text: impl AsRef<str>) -> &mut Line {
        match self.tokens.last_mut() {
            Some(last) => last.push_str(text.as_ref()),
            None => {
                self.tokens.push(text.as_ref().to_string());
            }
        }
        self
    }

    fn token(&self, i: usize) -> Option<&str> {
        self.tokens.get(i).map(|t| t.as_str())
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn is_comment(&self) -> bool {
        self.tokens.first().map_or(false, |t| t.starts_with("--"))
    }
}

/// A list of lines at some indent level.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Indent level of all lines in this block.
    pub indent: usize,
    lines: Vec<Line>,
}

impl Block {
    /// Construct an empty block at an indent level.
    pub fn new(indent: usize) -> Block {
        Block {
            indent,
            lines: vec![],
        }
    }

    /// Append a line.
    pub fn line(&mut self, line: Line) -> &mut Block {
        self.lines.push(line);
        self
    }

    /// Append all lines of another block, keeping this block's indent.
    pub fn block(&mut self, other: Block) -> &mut Block {
        self.lines.extend(other.lines);
        self
    }

    /// Append `suffix` to the end of every line. Used for separators
    /// that every item needs, like the `;` after each port of a
    /// non-final flattened port declaration. Comment lines are left
    /// alone.
    pub fn suffix_all(&mut self, suffix: &str) -> &mut Block {
        for line in self.lines.iter_mut().filter(|l| !l.is_comment()) {
            line.append(suffix);
        }
        self
    }

    /// Append `suffix` to every line except the last. Used for list
    /// separators, so the final item lacks its trailing `;` or `,`.
    /// Comment lines are left alone and do not count as last.
    pub fn suffix_all_but_last(&mut self, suffix: &str) -> &mut Block {
        if let Some(last) = self.lines.iter().rposition(|l| !l.is_comment()) {
            for (i, line) in self.lines.iter_mut().enumerate() {
                if i != last && !line.is_comment() {
                    line.append(suffix);
                }
            }
        }
        self
    }

    /// True when the block holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Block {
    /// Render with per-column alignment: every token except the last of
    /// each line is padded to the widest token in its column.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let columns = self.lines.iter().map(Line::len).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for line in &self.lines {
            for i in 0..line.len().saturating_sub(1) {
                widths[i] = widths[i].max(line.token(i).unwrap_or("").len());
            }
        }
        for line in &self.lines {
            let mut rendered = " ".repeat(INDENT * self.indent);
            for i in 0..line.len() {
                let token = line.token(i).unwrap_or("");
                if i + 1 < line.len() {
                    rendered.push_str(&format!("{:width$}", token, width = widths[i]));
                } else {
                    rendered.push_str(token);
                }
            }
            writeln!(f, "{}", rendered.trim_end())?;
        }
        Ok(())
    }
}

/// A sequence of blocks.
#[derive(Debug, Clone, Default)]
pub struct MultiBlock {
    /// Base indent level for blocks constructed alongside this one.
    pub indent: usize,
    blocks: Vec<Block>,
}

impl MultiBlock {
    /// Construct an empty multi-block with a base indent level.
    pub fn new(indent: usize) -> MultiBlock {
        MultiBlock {
            indent,
            blocks: vec![],
        }
    }

    /// Append a block.
    pub fn block(&mut self, block: Block) -> &mut MultiBlock {
        self.blocks.push(block);
        self
    }

    /// Append all blocks of another multi-block.
    pub fn multi(&mut self, other: MultiBlock) -> &mut MultiBlock {
        self.blocks.extend(other.blocks);
        self
    }

    /// Shift every contained block deeper by `levels` indent levels.
    pub fn shift(&mut self, levels: usize) -> &mut MultiBlock {
        for block in self.blocks.iter_mut() {
            block.indent += levels;
        }
        self
    }
}

impl fmt::Display for MultiBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_append() {
        let mut l = Line::from("a");
        l.push(" => ").push("b");
        l.append("(0)");
        let mut b = Block::new(0);
        b.line(l);
        assert_eq!(b.to_string(), "a => b(0)\n");
    }

    #[test]
    fn column_alignment() {
        let mut b = Block::new(1);
        let mut l0 = Line::new();
        l0.push("clk").push(" : ").push("in ").push("std_logic");
        let mut l1 = Line::new();
        l1.push("data_out").push(" : ").push("out ").push("std_logic");
        b.line(l0).line(l1);
        assert_eq!(
            b.to_string(),
            concat!(
                "  clk      : in  std_logic\n",
                "  data_out : out std_logic\n",
            )
        );
    }

    #[test]
    fn suffixes() {
        let mut b = Block::new(0);
        b.line(Line::from("a"));
        b.line(Line::from("b"));
        b.line(Line::from("c"));
        b.suffix_all_but_last(";");
        assert_eq!(b.to_string(), "a;\nb;\nc\n");
        let mut b = Block::new(0);
        b.line(Line::from("a"));
        b.line(Line::from("b"));
        b.suffix_all(";");
        assert_eq!(b.to_string(), "a;\nb;\n");
    }

    #[test]
    fn suffixes_skip_comment_lines() {
        let mut b = Block::new(0);
        b.line(Line::from("-- the first item"));
        b.line(Line::from("a"));
        b.line(Line::from("-- the last item"));
        b.line(Line::from("b"));
        b.suffix_all_but_last(";");
        assert_eq!(b.to_string(), "-- the first item\na;\n-- the last item\nb\n");
        b.suffix_all(",");
        assert_eq!(
            b.to_string(),
            "-- the first item\na;,\n-- the last item\nb,\n"
        );
    }

    #[test]
    fn multi_block_concatenates() {
        let mut h = Block::new(0);
        h.line(Line::from("port ("));
        let mut body = Block::new(1);
        body.line(Line::from("x : in std_logic"));
        let mut f = Block::new(0);
        f.line(Line::from(");"));
        let mut m = MultiBlock::new(0);
        m.block(h).block(body).block(f);
        assert_eq!(m.to_string(), "port (\n  x : in std_logic\n);\n");
    }
}
