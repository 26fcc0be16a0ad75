//! Style roles mapping logical names to `colored::Color`
//!
//! Each role is a variant of `StyleRole`. Colouring is applied only when the
//! `enabled` flag passed to `paint()` is true, so there is no global state.
//!
//! ```
//! use broadcastq::core::styles::StyleRole;
//! let plain = StyleRole::Header.paint("Summary", false);
//! assert_eq!(plain, "Summary");
//! let colored = StyleRole::Header.paint("Summary", true);
//! assert!(colored.starts_with("\x1b["));
//! assert!(colored.ends_with("\x1b[0m"));
//! ```

use clap::builder::styling::AnsiColor;
use colored::Color;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }

            pub fn ansi_code(self) -> Option<&'static str> {
                map_color_code(self.color()?)
            }

            pub fn paint(self, text: &str, enabled: bool) -> String {
                if !enabled { return text.to_string(); }
                if let Some(code) = self.ansi_code() { return format!("\x1b[{}m{}\x1b[0m", code, text); }
                text.to_string()
            }

            /// prettytable style_spec for this role, e.g. `Fy`
            pub fn to_prettytable_spec(self) -> Option<String> {
                let spec_char = match self.color()? {
                    Color::Red => "r",
                    Color::Green => "g",
                    Color::Yellow => "y",
                    Color::Blue => "b",
                    Color::Cyan => "c",
                    Color::BrightBlack => "K",
                    Color::BrightRed => "R",
                    Color::BrightGreen => "G",
                    _ => return None,
                };

                Some(format!("F{}", spec_char))
            }
        }
    }
}

// Value => None (uncoloured)
style! {
    Header      => Some(Color::Yellow),
    Literal     => Some(Color::Cyan),
    Placeholder => Some(Color::Green),
    Valid       => Some(Color::Green),
    Invalid     => Some(Color::Red),
    Error       => Some(Color::BrightRed),
    Key         => Some(Color::BrightGreen),
    Value       => None,
    Dim         => Some(Color::BrightBlack)
}

fn map_color_code(c: Color) -> Option<&'static str> {
    use Color::*;
    match c {
        Red => Some("31"),
        Green => Some("32"),
        Yellow => Some("33"),
        Blue => Some("34"),
        Cyan => Some("36"),
        BrightBlack => Some("90"),
        BrightRed => Some("91"),
        BrightGreen => Some("92"),
        _ => None,
    }
}

fn color_to_ansi(c: Color) -> Option<AnsiColor> {
    use self::AnsiColor as A;
    use Color::*;
    Some(match c {
        Red => A::Red,
        Green => A::Green,
        Yellow => A::Yellow,
        Blue => A::Blue,
        Cyan => A::Cyan,
        BrightBlack => A::BrightBlack,
        BrightRed => A::BrightRed,
        BrightGreen => A::BrightGreen,
        _ => return None,
    })
}

/// Build clap Styles for help output from the style roles
pub fn palette_to_clap(enabled: bool) -> clap::builder::Styles {
    use clap::builder::styling::{Color as ClapColor, Style};
    if !enabled {
        return clap::builder::Styles::plain();
    }

    let style = |role: StyleRole, bold: bool| {
        let mut s = Style::new();
        if let Some(col) = role.color().and_then(color_to_ansi) {
            s = s.fg_color(Some(ClapColor::Ansi(col)));
        }
        if bold {
            s = s.bold();
        }
        s
    };

    clap::builder::Styles::styled()
        .header(style(StyleRole::Header, true))
        .literal(style(StyleRole::Literal, false))
        .placeholder(style(StyleRole::Placeholder, false))
        .valid(style(StyleRole::Valid, false))
        .invalid(style(StyleRole::Invalid, false))
        .error(style(StyleRole::Error, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_code_header() {
        assert_eq!(StyleRole::Header.ansi_code(), Some("33"));
        assert_eq!(StyleRole::Value.ansi_code(), None);
    }

    #[test]
    fn paint_enabled_disabled() {
        let txt = "Hello";
        let colored = StyleRole::Header.paint(txt, true);
        assert!(colored.starts_with("\x1b[33m") && colored.ends_with("\x1b[0m"));
        assert_eq!(StyleRole::Header.paint(txt, false), txt);
        assert_eq!(StyleRole::Value.paint(txt, true), txt);
    }

    #[test]
    fn prettytable_specs() {
        assert_eq!(StyleRole::Key.to_prettytable_spec().as_deref(), Some("FG"));
        assert_eq!(StyleRole::Dim.to_prettytable_spec().as_deref(), Some("FK"));
        assert_eq!(StyleRole::Value.to_prettytable_spec(), None);
    }

    #[test]
    fn palette_to_clap_differs_when_enabled() {
        let plain_dbg = format!("{:?}", palette_to_clap(false));
        let styled_dbg = format!("{:?}", palette_to_clap(true));
        assert_ne!(plain_dbg, styled_dbg);
    }
}
