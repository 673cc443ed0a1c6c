//! Domain constants shared by models, devices and test code.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Default text encoding of device payloads.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Accessible action names.
pub const ACTIONS: &[&str] = &[
    "ACTIVATE",
    "CLICK",
    "EXPAND_OR_CONTRACT",
    "JUMP",
    "PRESS",
    "RELEASE",
    "TOGGLE",
];

/// Accessible relation names.
pub const RELATIONS: &[&str] = &[
    "CONTROLLED_BY",
    "CONTROLLER_FOR",
    "DESCRIBED_BY",
    "DESCRIPTION_FOR",
    "EMBEDDED_BY",
    "EMBEDS",
    "FLOWS_FROM",
    "FLOWS_TO",
    "LABELLED_BY",
    "LABEL_FOR",
    "MEMBER_OF",
    "NODE_CHILD_OF",
    "PARENT_WINDOW_OF",
    "POPUP_FOR",
    "SUBWINDOW_OF",
    "TOOLTIP_FOR",
];

/// Accessible role names.
pub const ROLES: &[&str] = &[
    "ALERT",
    "APPLICATION",
    "CANVAS",
    "CHECK_BOX",
    "CHECK_MENU_ITEM",
    "COMBO_BOX",
    "DIALOG",
    "DOCUMENT_FRAME",
    "ENTRY",
    "FILLER",
    "FRAME",
    "HEADING",
    "ICON",
    "IMAGE",
    "LABEL",
    "LINK",
    "LIST",
    "LIST_ITEM",
    "MENU",
    "MENU_BAR",
    "MENU_ITEM",
    "PAGE_TAB",
    "PAGE_TAB_LIST",
    "PANEL",
    "PARAGRAPH",
    "PASSWORD_TEXT",
    "PROGRESS_BAR",
    "PUSH_BUTTON",
    "RADIO_BUTTON",
    "RADIO_MENU_ITEM",
    "SCROLL_BAR",
    "SCROLL_PANE",
    "SECTION",
    "SEPARATOR",
    "SLIDER",
    "SPIN_BUTTON",
    "SPLIT_PANE",
    "STATUS_BAR",
    "TABLE",
    "TABLE_CELL",
    "TABLE_COLUMN_HEADER",
    "TEXT",
    "TOGGLE_BUTTON",
    "TOOL_BAR",
    "TOOL_TIP",
    "TREE",
    "TREE_TABLE",
    "UNKNOWN",
    "VIEWPORT",
    "WINDOW",
];

/// Accessible state names.
pub const STATES: &[&str] = &[
    "ACTIVE",
    "ARMED",
    "BUSY",
    "CHECKED",
    "COLLAPSED",
    "DEFUNCT",
    "EDITABLE",
    "ENABLED",
    "EXPANDABLE",
    "EXPANDED",
    "FOCUSABLE",
    "FOCUSED",
    "HORIZONTAL",
    "ICONIFIED",
    "MODAL",
    "MULTISELECTABLE",
    "MULTI_LINE",
    "OPAQUE",
    "PRESSED",
    "RESIZABLE",
    "SELECTABLE",
    "SELECTED",
    "SENSITIVE",
    "SHOWING",
    "SINGLE_LINE",
    "VERTICAL",
    "VISIBLE",
];

/// Key names and their X keysyms.
pub const KEY_SYMS: &[(&str, u32)] = &[
    ("ALT_L", 0xffe9),
    ("ALT_R", 0xffea),
    ("BACKSPACE", 0xff08),
    ("CAPS_LOCK", 0xffe5),
    ("CONTROL_L", 0xffe3),
    ("CONTROL_R", 0xffe4),
    ("DELETE", 0xffff),
    ("DOWN", 0xff54),
    ("END", 0xff57),
    ("ENTER", 0xff0d),
    ("ESCAPE", 0xff1b),
    ("F1", 0xffbe),
    ("F2", 0xffbf),
    ("F3", 0xffc0),
    ("F4", 0xffc1),
    ("F5", 0xffc2),
    ("F6", 0xffc3),
    ("F7", 0xffc4),
    ("F8", 0xffc5),
    ("F9", 0xffc6),
    ("F10", 0xffc7),
    ("F11", 0xffc8),
    ("F12", 0xffc9),
    ("HOME", 0xff50),
    ("INSERT", 0xff63),
    ("LEFT", 0xff51),
    ("MENU", 0xff67),
    ("NUM_LOCK", 0xff7f),
    ("PAGE_DOWN", 0xff56),
    ("PAGE_UP", 0xff55),
    ("PRINT", 0xff61),
    ("RIGHT", 0xff53),
    ("SHIFT_L", 0xffe1),
    ("SHIFT_R", 0xffe2),
    ("SPACE", 0x0020),
    ("SUPER_L", 0xffeb),
    ("SUPER_R", 0xffec),
    ("TAB", 0xff09),
    ("UP", 0xff52),
];

/// Modifier key names and their hardware keycodes.
pub const KEY_CODES: &[(&str, u32)] = &[
    ("ALT", 64),
    ("ALT_GR", 108),
    ("CONTROL", 37),
    ("SHIFT", 50),
    ("SUPER", 133),
];

/// Keysym of a key name or a single character.
///
/// Names are matched case-insensitively. Latin-1 characters map to their
/// code point, any other character to the Unicode keysym range.
///
/// ```
/// use tadek_core::constants::keysym_for;
///
/// assert_eq!(keysym_for("enter"), Some(0xff0d));
/// assert_eq!(keysym_for("a"), Some(0x61));
/// assert_eq!(keysym_for("ł"), Some(0x0100_0142));
/// assert_eq!(keysym_for("NOPE"), None);
/// ```
#[must_use]
pub fn keysym_for(key: &str) -> Option<u32> {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let code = u32::from(c);
        return Some(if (0x20..=0xff).contains(&code) {
            code
        } else {
            0x0100_0000 | code
        });
    }
    KEY_SYMS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|&(_, sym)| sym)
}

/// Hardware keycode of a modifier name, matched case-insensitively.
#[must_use]
pub fn keycode_for(modifier: &str) -> Option<u32> {
    KEY_CODES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(modifier))
        .map(|&(_, code)| code)
}

/// Error returned when a constant name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown name '{0}'")]
pub struct UnknownName(pub String);

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[doc = $text] $variant),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownName(s.to_string()))
            }
        }
    };
}

named_enum!(
    /// Mouse button.
    MouseButton {
        Left => "LEFT",
        Middle => "MIDDLE",
        Right => "RIGHT",
    }
);

named_enum!(
    /// Kind of mouse event.
    MouseEventKind {
        Click => "CLICK",
        DoubleClick => "DOUBLE_CLICK",
        Press => "PRESS",
        Release => "RELEASE",
        AbsoluteMotion => "ABSOLUTE_MOTION",
        RelativeMotion => "RELATIVE_MOTION",
    }
);

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn keysyms_by_name_and_char() {
        assert_eq!(keysym_for("Tab"), Some(0xff09));
        assert_eq!(keysym_for(" "), Some(0x20));
        assert_eq!(keysym_for("é"), Some(0xe9));
        assert_eq!(keysym_for(""), None);
    }

    #[test]
    fn keycodes_by_modifier() {
        assert_eq!(keycode_for("shift"), Some(50));
        assert_eq!(keycode_for("HYPER"), None);
    }

    #[test]
    fn enums_parse_wire_names() {
        assert_eq!(
            "double_click".parse::<MouseEventKind>().unwrap(),
            MouseEventKind::DoubleClick
        );
        assert_eq!(MouseButton::Right.to_string(), "RIGHT");
        let err = "WHEEL".parse::<MouseButton>().unwrap_err();
        assert_eq!(err, UnknownName("WHEEL".to_string()));
        assert_eq!(err.to_string(), "unknown name 'WHEEL'");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
        assert_eq!(MouseEventKind::ALL.len(), 6);
    }

    #[test]
    fn tables_are_sorted_and_unique() {
        for table in [ACTIONS, RELATIONS, ROLES, STATES] {
            assert!(table.windows(2).all(|w| w[0] < w[1]), "{table:?}");
        }
    }
}
