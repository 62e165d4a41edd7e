// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pretty printers for reporting information as a tree of blocks, e.g.
//!
//! ```text
//! Building matrices
//! ├ Input: /data/sh2
//! ├ Output: /data/sh2/matrices
//! └ Aggregation: 128 channels × 16 samples
//! ```

use std::{borrow::Cow, sync::Mutex};

const VERTICAL: char = '│';
const UP_AND_RIGHT: char = '└';
const VERTICAL_AND_RIGHT: char = '├';

lazy_static::lazy_static! {
    static ref WARNINGS: Mutex<Vec<Vec<Cow<'static, str>>>> = Mutex::new(vec![]);
}

type Block = Vec<Cow<'static, str>>;

/// Prefix each line of the blocks with a tree symbol. Only the first line of
/// the last block closes the tree.
fn tree_lines(blocks: &[Block]) -> Vec<String> {
    let num_blocks = blocks.len();
    let mut lines = vec![];
    for (i_block, block) in blocks.iter().enumerate() {
        let num_lines = block.len();
        for (i_line, line) in block.iter().enumerate() {
            let symbol = match (i_line, i_line + 1 == num_lines, i_block + 1 == num_blocks) {
                (0, true, true) => UP_AND_RIGHT,
                (0, _, _) => VERTICAL_AND_RIGHT,
                _ => VERTICAL,
            };
            lines.push(format!("{symbol} {line}"));
        }
    }
    lines
}

pub(crate) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Vec<Block>,
}

impl InfoPrinter {
    pub(crate) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: vec![],
        }
    }

    pub(crate) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    pub(crate) fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub(crate) fn display(self) {
        log::info!("{}", console::style(self.title).bold());
        for line in tree_lines(&self.blocks) {
            log::info!("{line}");
        }
        log::info!("");
    }
}

/// Something that can be put aside and shown later as a warning.
pub(crate) trait Warn {
    fn warn(self);
}

fn push_warning(warnings: &Mutex<Vec<Block>>, block: Block) {
    match warnings.lock() {
        Ok(mut warnings) => warnings.push(block),
        // Nothing else can use the warnings now; print them straight away.
        Err(_) => block.iter().for_each(|line| log::warn!("{line}")),
    }
}

impl Warn for &'static str {
    fn warn(self) {
        push_warning(&WARNINGS, vec![self.into()]);
    }
}

/// Print out any warnings that have been collected as CLI arguments have been
/// parsed. This should only be called once all arguments have been parsed.
pub(crate) fn display_warnings() {
    let blocks = match WARNINGS.lock() {
        Ok(mut warnings) => std::mem::take(&mut *warnings),
        Err(_) => return,
    };
    if blocks.is_empty() {
        return;
    }

    log::warn!("{}", console::style("Warnings").bold());
    for line in tree_lines(&blocks) {
        log::warn!("{line}");
    }
    log::warn!("");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_lines() {
        let blocks: Vec<Block> = vec![
            vec!["Input: /data".into()],
            vec!["Dates: all dates".into(), "(no filter)".into()],
            vec!["Output: /out".into()],
        ];
        assert_eq!(
            tree_lines(&blocks),
            vec![
                "├ Input: /data",
                "├ Dates: all dates",
                "│ (no filter)",
                "└ Output: /out",
            ]
        );
    }

    #[test]
    fn test_pushed_warnings_are_kept_in_order() {
        let warnings = Mutex::new(vec![]);
        push_warning(&warnings, vec!["Aggregation factors are ignored".into()]);
        push_warning(&warnings, vec!["first line".into(), "second line".into()]);
        let warnings = warnings.into_inner().unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0], vec!["Aggregation factors are ignored"]);
        assert_eq!(
            tree_lines(&warnings),
            vec![
                "├ Aggregation factors are ignored",
                "├ first line",
                "│ second line",
            ]
        );
    }
}
