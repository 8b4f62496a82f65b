//! Android key codes sent through `adb shell input`.

use strum::{AsRefStr, Display, EnumString};

/// The subset of `KeyEvent.KEYCODE_*` constants adbterm sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
pub enum AndroidKey {
    #[strum(serialize = "KEYCODE_ENTER")]
    Enter,
    #[strum(serialize = "KEYCODE_POWER")]
    Power,
    /// Ends a call, or puts the screen to sleep when idle.
    #[strum(serialize = "KEYCODE_ENDCALL")]
    EndCall,
    #[strum(serialize = "KEYCODE_CTRL_RIGHT")]
    CtrlRight,
    #[strum(serialize = "KEYCODE_C")]
    C,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_as_keycode_names() {
        assert_eq!(AndroidKey::Enter.as_ref(), "KEYCODE_ENTER");
        assert_eq!(AndroidKey::CtrlRight.to_string(), "KEYCODE_CTRL_RIGHT");
    }

    #[test]
    fn keys_parse_from_keycode_names() {
        let key: AndroidKey = "KEYCODE_ENDCALL".parse().unwrap();
        assert_eq!(key, AndroidKey::EndCall);
    }
}
