use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextField,
    PrevField,
    NextOption,
    PrevOption,
    Activate,
    BeginEdit,
    Submit,
    Refresh,
    ToggleHelp,
    Dismiss,
    FinishEdit,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Editing => map_edit_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Submit)
        }
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextField),
        KeyCode::BackTab => Some(Action::PrevField),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::NextField),
        KeyCode::Down => Some(Action::NextField),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::PrevField),
        KeyCode::Up => Some(Action::PrevField),
        KeyCode::Right => Some(Action::NextOption),
        KeyCode::Char('l') if key.modifiers.is_empty() => Some(Action::NextOption),
        KeyCode::Left => Some(Action::PrevOption),
        KeyCode::Char('h') if key.modifiers.is_empty() => Some(Action::PrevOption),
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char('i') | KeyCode::Char('a') => Some(Action::BeginEdit),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Esc => Some(Action::Dismiss),
        _ => None,
    }
}

fn map_edit_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => Some(Action::FinishEdit),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Submit)
        }
        KeyCode::Char(c)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn ctrl_s_submits_in_both_modes() {
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Submit));
        assert_eq!(map_key(InputMode::Editing, key), Some(Action::Submit));
    }

    #[test]
    fn edit_mode_takes_plain_and_shifted_chars() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Editing, key), Some(Action::InputChar('q')));
        let key = KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Editing, key), Some(Action::InputChar('K')));
    }

    #[test]
    fn edit_mode_rejects_ctrl_c() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Editing, key), None);
    }

    #[test]
    fn arrows_walk_fields_and_options() {
        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        let right = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        let backtab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, down), Some(Action::NextField));
        assert_eq!(map_key(InputMode::Normal, right), Some(Action::NextOption));
        assert_eq!(map_key(InputMode::Normal, backtab), Some(Action::PrevField));
    }

    #[test]
    fn esc_finishes_edit() {
        let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Editing, key), Some(Action::FinishEdit));
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Dismiss));
    }
}
