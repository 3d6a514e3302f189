//! Keyboard key names and Linux input-event codes.
//!
//! Key names are matched case-insensitively. Codes are the values from
//! `linux/input-event-codes.h`, so they can be handed to uinput unchanged.
//!
//! # Supported Keys
//!
//! ## Letters
//! `a-z`
//!
//! ## Numbers
//! `0-9` (top row)
//!
//! ## Function Keys
//! `f1` through `f12`
//!
//! ## Modifiers
//! - `shift`/`leftshift`/`lshift`, `rightshift`/`rshift`
//! - `ctrl`/`control`/`leftctrl`/`lctrl`, `rightctrl`/`rctrl`
//! - `alt`/`leftalt`/`lalt`, `rightalt`/`ralt`/`altgr`
//! - `meta`/`super`/`leftmeta`, `rightmeta`
//!
//! ## Navigation
//! `up`, `down`, `left`, `right`, `home`, `end`, `pageup`/`pgup`,
//! `pagedown`/`pgdown`, `insert`/`ins`, `delete`/`del`
//!
//! ## Numpad
//! `kp0-kp9`, `kp_plus`, `kp_minus`, `kp_multiply`, `kp_divide`,
//! `kp_dot`, `kp_enter`
//!
//! ## Special Keys
//! `esc`/`escape`, `tab`, `capslock`, `enter`/`return`, `backspace`,
//! `space`, `numlock`, `scrolllock`, `pause`, `sysrq`/`printscreen`,
//! `mute`, `volumeup`, `volumedown`
//!
//! ## Punctuation
//! `-`, `=`, `[`, `]`, `;`, `'`, `` ` ``, `\`, `,`, `.`, `/`
//! (also by name: `minus`, `equal`, `comma`, `period`, ...)

use std::fmt;

/// A keyboard key, identified by its Linux input-event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const ESC: KeyCode = KeyCode(1);
    pub const ENTER: KeyCode = KeyCode(28);
    pub const LEFTCTRL: KeyCode = KeyCode(29);
    pub const LEFTSHIFT: KeyCode = KeyCode(42);
    pub const LEFTALT: KeyCode = KeyCode(56);
    pub const SPACE: KeyCode = KeyCode(57);
    pub const F4: KeyCode = KeyCode(62);
    pub const UP: KeyCode = KeyCode(103);
    pub const LEFT: KeyCode = KeyCode(105);
    pub const RIGHT: KeyCode = KeyCode(106);
    pub const DOWN: KeyCode = KeyCode(108);

    /// Look a key up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        KEY_TABLE
            .iter()
            .find(|(names, _)| names.iter().any(|n| *n == lower))
            .map(|(_, code)| KeyCode(*code))
    }

    /// Canonical (first listed) name of this key, if it is in the table.
    pub fn name(&self) -> Option<&'static str> {
        KEY_TABLE
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(names, _)| names[0])
    }

    /// Every key code known to the table, used to advertise capabilities.
    pub fn all() -> impl Iterator<Item = KeyCode> {
        KEY_TABLE.iter().map(|(_, code)| KeyCode(*code))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "key#{}", self.0),
        }
    }
}

const KEY_TABLE: &[(&[&str], u16)] = &[
    // Special
    (&["esc", "escape"], 1),
    (&["1"], 2),
    (&["2"], 3),
    (&["3"], 4),
    (&["4"], 5),
    (&["5"], 6),
    (&["6"], 7),
    (&["7"], 8),
    (&["8"], 9),
    (&["9"], 10),
    (&["0"], 11),
    (&["minus", "-"], 12),
    (&["equal", "="], 13),
    (&["backspace", "back_space"], 14),
    (&["tab"], 15),
    (&["q"], 16),
    (&["w"], 17),
    (&["e"], 18),
    (&["r"], 19),
    (&["t"], 20),
    (&["y"], 21),
    (&["u"], 22),
    (&["i"], 23),
    (&["o"], 24),
    (&["p"], 25),
    (&["leftbrace", "["], 26),
    (&["rightbrace", "]"], 27),
    (&["enter", "return"], 28),
    (&["leftctrl", "ctrl", "control", "lctrl"], 29),
    (&["a"], 30),
    (&["s"], 31),
    (&["d"], 32),
    (&["f"], 33),
    (&["g"], 34),
    (&["h"], 35),
    (&["j"], 36),
    (&["k"], 37),
    (&["l"], 38),
    (&["semicolon", ";"], 39),
    (&["apostrophe", "'"], 40),
    (&["grave", "`"], 41),
    (&["leftshift", "shift", "lshift"], 42),
    (&["backslash", "\\"], 43),
    (&["z"], 44),
    (&["x"], 45),
    (&["c"], 46),
    (&["v"], 47),
    (&["b"], 48),
    (&["n"], 49),
    (&["m"], 50),
    (&["comma", ","], 51),
    (&["period", "dot", "."], 52),
    (&["slash", "/"], 53),
    (&["rightshift", "rshift"], 54),
    (&["kp_multiply", "kpasterisk", "kp*"], 55),
    (&["leftalt", "alt", "lalt"], 56),
    (&["space", "spacebar"], 57),
    (&["capslock", "caps"], 58),
    (&["f1"], 59),
    (&["f2"], 60),
    (&["f3"], 61),
    (&["f4"], 62),
    (&["f5"], 63),
    (&["f6"], 64),
    (&["f7"], 65),
    (&["f8"], 66),
    (&["f9"], 67),
    (&["f10"], 68),
    (&["numlock"], 69),
    (&["scrolllock"], 70),
    (&["kp7"], 71),
    (&["kp8"], 72),
    (&["kp9"], 73),
    (&["kp_minus", "kp-"], 74),
    (&["kp4"], 75),
    (&["kp5"], 76),
    (&["kp6"], 77),
    (&["kp_plus", "kp+"], 78),
    (&["kp1"], 79),
    (&["kp2"], 80),
    (&["kp3"], 81),
    (&["kp0"], 82),
    (&["kp_dot", "kp."], 83),
    (&["f11"], 87),
    (&["f12"], 88),
    (&["kp_enter", "kpenter"], 96),
    (&["rightctrl", "rctrl"], 97),
    (&["kp_divide", "kp/"], 98),
    (&["sysrq", "printscreen"], 99),
    (&["rightalt", "ralt", "altgr"], 100),
    // Navigation
    (&["home"], 102),
    (&["up"], 103),
    (&["pageup", "pgup"], 104),
    (&["left"], 105),
    (&["right"], 106),
    (&["end"], 107),
    (&["down"], 108),
    (&["pagedown", "pgdown"], 109),
    (&["insert", "ins"], 110),
    (&["delete", "del"], 111),
    // Media
    (&["mute"], 113),
    (&["volumedown"], 114),
    (&["volumeup"], 115),
    (&["pause"], 119),
    (&["leftmeta", "meta", "super"], 125),
    (&["rightmeta"], 126),
];
