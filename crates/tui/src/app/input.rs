use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use webline_core::EditEvent;

// Decode a key press aimed at the address bar. Keys with no editor meaning
// (function keys, Ctrl chords we don't bind) yield None.
pub fn edit_event(key: &KeyEvent) -> Option<EditEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let ev = match key.code {
        KeyCode::Enter => EditEvent::Commit,
        KeyCode::Esc => EditEvent::Cancel,
        KeyCode::Backspace => EditEvent::DeleteBackward,
        KeyCode::Delete => EditEvent::DeleteForward,
        KeyCode::Left => EditEvent::MoveLeft,
        KeyCode::Right => EditEvent::MoveRight,
        KeyCode::Home => EditEvent::MoveHome,
        KeyCode::End => EditEvent::MoveEnd,
        KeyCode::Up => EditEvent::RecallOlder,
        KeyCode::Down => EditEvent::RecallNewer,
        KeyCode::Tab => EditEvent::Autocomplete,
        KeyCode::Char('a') if ctrl => EditEvent::MoveHome,
        KeyCode::Char('e') if ctrl => EditEvent::MoveEnd,
        KeyCode::Char('p') if ctrl => EditEvent::RecallOlder,
        KeyCode::Char('n') if ctrl => EditEvent::RecallNewer,
        KeyCode::Char('h') if ctrl => EditEvent::DeleteBackward,
        KeyCode::Char(_) if ctrl || alt => return None,
        KeyCode::Char(ch) => EditEvent::Input(ch),
        _ => return None,
    };
    Some(ev)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn navigation_keys_map_to_editor_events() {
        let none = KeyModifiers::NONE;
        assert_eq!(edit_event(&key(KeyCode::Enter, none)), Some(EditEvent::Commit));
        assert_eq!(edit_event(&key(KeyCode::Up, none)), Some(EditEvent::RecallOlder));
        assert_eq!(edit_event(&key(KeyCode::Down, none)), Some(EditEvent::RecallNewer));
        assert_eq!(edit_event(&key(KeyCode::Tab, none)), Some(EditEvent::Autocomplete));
        assert_eq!(edit_event(&key(KeyCode::Esc, none)), Some(EditEvent::Cancel));
    }

    #[test]
    fn ctrl_chords() {
        let ctrl = KeyModifiers::CONTROL;
        assert_eq!(edit_event(&key(KeyCode::Char('a'), ctrl)), Some(EditEvent::MoveHome));
        assert_eq!(edit_event(&key(KeyCode::Char('p'), ctrl)), Some(EditEvent::RecallOlder));
        assert_eq!(edit_event(&key(KeyCode::Char('x'), ctrl)), None);
    }

    #[test]
    fn shifted_chars_are_input() {
        assert_eq!(
            edit_event(&key(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(EditEvent::Input('Q'))
        );
        assert_eq!(edit_event(&key(KeyCode::F(5), KeyModifiers::NONE)), None);
    }
}
