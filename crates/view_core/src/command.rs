//! Command system for user actions

use crate::ViewerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Navigation commands
    pub const NAV_NEXT_ITEM: &'static str = "nav.next_item";
    pub const NAV_PREV_ITEM: &'static str = "nav.prev_item";
    pub const NAV_OPEN: &'static str = "nav.open";

    // View commands
    pub const VIEW_ZOOM_IN: &'static str = "view.zoom_in";
    pub const VIEW_ZOOM_OUT: &'static str = "view.zoom_out";
    pub const VIEW_ZOOM_SET: &'static str = "view.zoom_set";
    pub const VIEW_FIT_TO_WINDOW: &'static str = "view.fit_to_window";
    pub const VIEW_ORIGINAL_SIZE: &'static str = "view.original_size";
    pub const VIEW_ROTATE_LEFT: &'static str = "view.rotate_left";
    pub const VIEW_ROTATE_RIGHT: &'static str = "view.rotate_right";
    pub const VIEW_ROTATE: &'static str = "view.rotate";
    pub const VIEW_FLIP_HORIZONTAL: &'static str = "view.flip_horizontal";
    pub const VIEW_FLIP_VERTICAL: &'static str = "view.flip_vertical";
    pub const VIEW_SCROLL: &'static str = "view.scroll";
    pub const VIEW_RESET: &'static str = "view.reset";

    // Filter commands
    pub const FILTER_GRAYSCALE: &'static str = "filter.grayscale";
    pub const FILTER_SEPIA: &'static str = "filter.sepia";
    pub const FILTER_NEGATIVE: &'static str = "filter.negative";
    pub const FILTER_NORMAL: &'static str = "filter.normal";

    // Edit commands
    pub const EDIT_UNDO: &'static str = "edit.undo";
    pub const EDIT_REDO: &'static str = "edit.redo";
}

/// Short names accepted on the command line
const ALIASES: &[(&str, &str)] = &[
    ("next", CommandId::NAV_NEXT_ITEM),
    ("prev", CommandId::NAV_PREV_ITEM),
    ("open", CommandId::NAV_OPEN),
    ("zoom-in", CommandId::VIEW_ZOOM_IN),
    ("zoom-out", CommandId::VIEW_ZOOM_OUT),
    ("zoom", CommandId::VIEW_ZOOM_SET),
    ("fit", CommandId::VIEW_FIT_TO_WINDOW),
    ("actual-size", CommandId::VIEW_ORIGINAL_SIZE),
    ("rotate-left", CommandId::VIEW_ROTATE_LEFT),
    ("rotate-right", CommandId::VIEW_ROTATE_RIGHT),
    ("rotate", CommandId::VIEW_ROTATE),
    ("flip-h", CommandId::VIEW_FLIP_HORIZONTAL),
    ("flip-v", CommandId::VIEW_FLIP_VERTICAL),
    ("scroll", CommandId::VIEW_SCROLL),
    ("reset-view", CommandId::VIEW_RESET),
    ("grayscale", CommandId::FILTER_GRAYSCALE),
    ("sepia", CommandId::FILTER_SEPIA),
    ("negative", CommandId::FILTER_NEGATIVE),
    ("normal", CommandId::FILTER_NORMAL),
    ("undo", CommandId::EDIT_UNDO),
    ("redo", CommandId::EDIT_REDO),
];

/// Command with optional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: CommandId,
    pub params: CommandParams,
}

/// Command parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandParams {
    pub float_value: Option<f64>,
    pub pair_value: Option<(i32, i32)>,
    pub path_value: Option<PathBuf>,
}

impl Command {
    pub fn new(id: &str) -> Self {
        Self {
            id: CommandId::new(id),
            params: CommandParams::default(),
        }
    }

    pub fn with_float(mut self, value: f64) -> Self {
        self.params.float_value = Some(value);
        self
    }

    pub fn with_pair(mut self, a: i32, b: i32) -> Self {
        self.params.pair_value = Some((a, b));
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.params.path_value = Some(path.into());
        self
    }

    /// Parse a short command such as `rotate:45`, `scroll:10,-5` or `flip-h`.
    /// Full ids (`view.flip_horizontal`) are accepted too.
    pub fn parse(text: &str) -> Result<Self, ViewerError> {
        let text = text.trim();
        let (name, arg) = match text.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (text, None),
        };

        let id = ALIASES
            .iter()
            .find(|(alias, full)| *alias == name || *full == name)
            .map(|(_, full)| *full)
            .ok_or_else(|| ViewerError::InvalidCommand(text.to_string()))?;

        let cmd = Command::new(id);
        match (id, arg) {
            (CommandId::VIEW_ROTATE | CommandId::VIEW_ZOOM_SET, Some(arg)) => {
                let value = arg
                    .parse::<f64>()
                    .map_err(|_| ViewerError::InvalidCommand(text.to_string()))?;
                Ok(cmd.with_float(value))
            }
            (CommandId::VIEW_SCROLL | CommandId::VIEW_FIT_TO_WINDOW, Some(arg)) => {
                let (a, b) = parse_pair(arg).ok_or_else(|| ViewerError::InvalidCommand(text.to_string()))?;
                Ok(cmd.with_pair(a, b))
            }
            (CommandId::NAV_OPEN, Some(arg)) if !arg.is_empty() => Ok(cmd.with_path(arg)),
            (CommandId::VIEW_ROTATE | CommandId::VIEW_ZOOM_SET | CommandId::VIEW_SCROLL | CommandId::NAV_OPEN, None) => {
                Err(ViewerError::InvalidCommand(format!("{} needs an argument", name)))
            }
            (_, None) => Ok(cmd),
            (_, Some(_)) => Err(ViewerError::InvalidCommand(format!("{} takes no argument", name))),
        }
    }

    /// Parse a list separated by `,` or `;`. The comma of a `scroll:a,b` or
    /// `fit:a,b` argument stays with its command.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ViewerError> {
        split_ops(text).into_iter().map(Command::parse).collect()
    }
}

/// Accepts `a,b` and `axb`
fn parse_pair(arg: &str) -> Option<(i32, i32)> {
    let (a, b) = arg.split_once(',').or_else(|| arg.split_once(['x', 'X']))?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Split an op list on commas, keeping `name:a,b` pairs together
fn split_ops(text: &str) -> Vec<&str> {
    let mut ops = Vec::new();
    let mut start = 0;
    // Start of a pair argument whose comma has not been seen yet
    let mut pair_from: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match c {
            ':' => {
                let name = text[start..i].trim();
                pair_from = takes_pair(name).then_some(i + 1);
            }
            ',' if pair_from.is_some_and(|from| !text[from..i].contains(['x', 'X'])) => {
                pair_from = None;
            }
            ',' | ';' => {
                ops.push(&text[start..i]);
                start = i + 1;
                pair_from = None;
            }
            _ => {}
        }
    }
    ops.push(&text[start..]);
    ops.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn takes_pair(name: &str) -> bool {
    ALIASES.iter().any(|(alias, full)| {
        (*alias == name || *full == name)
            && (*full == CommandId::VIEW_SCROLL || *full == CommandId::VIEW_FIT_TO_WINDOW)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(Command::parse("flip-h").unwrap().id.as_str(), CommandId::VIEW_FLIP_HORIZONTAL);
        assert_eq!(Command::parse(" undo ").unwrap().id.as_str(), CommandId::EDIT_UNDO);
        assert_eq!(Command::parse("filter.sepia").unwrap().id.as_str(), CommandId::FILTER_SEPIA);
    }

    #[test]
    fn test_parse_arguments() {
        let rotate = Command::parse("rotate:-45.5").unwrap();
        assert_eq!(rotate.params.float_value, Some(-45.5));

        let scroll = Command::parse("scroll:10,-5").unwrap();
        assert_eq!(scroll.params.pair_value, Some((10, -5)));

        let fit = Command::parse("fit:800x600").unwrap();
        assert_eq!(fit.params.pair_value, Some((800, 600)));

        let fit = Command::parse("fit").unwrap();
        assert_eq!(fit.params.pair_value, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Command::parse("explode"), Err(ViewerError::InvalidCommand(_))));
        assert!(Command::parse("rotate").is_err());
        assert!(Command::parse("rotate:abc").is_err());
        assert!(Command::parse("undo:3").is_err());
    }

    #[test]
    fn test_parse_list_keeps_pairs() {
        let ops = Command::parse_list("rotate:90, scroll:3,4,flip-v;grayscale").unwrap();
        let ids: Vec<_> = ops.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            [CommandId::VIEW_ROTATE, CommandId::VIEW_SCROLL, CommandId::VIEW_FLIP_VERTICAL, CommandId::FILTER_GRAYSCALE]
        );
        assert_eq!(ops[1].params.pair_value, Some((3, 4)));

        let ops = Command::parse_list("fit:800x600,sepia").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].params.pair_value, Some((800, 600)));
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(Command::parse_list(" , ").unwrap().is_empty());
    }
}
