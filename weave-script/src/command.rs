//! Command keyword table.

/// Every command keyword the parser recognises after `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SetBackground,
    ClearBackground,
    SetCharacter,
    ClearCharacterPosition,
    ClearCharacterPositions,
    End,
    Assign,
    GoTo,
    HideUi,
    ShowUi,
    PlaySound,
    PlayMusic,
    StopMusic,
    NextDialog,
}

impl CommandKind {
    pub const ALL: [CommandKind; 14] = [
        CommandKind::SetBackground,
        CommandKind::ClearBackground,
        CommandKind::SetCharacter,
        CommandKind::ClearCharacterPosition,
        CommandKind::ClearCharacterPositions,
        CommandKind::End,
        CommandKind::Assign,
        CommandKind::GoTo,
        CommandKind::HideUi,
        CommandKind::ShowUi,
        CommandKind::PlaySound,
        CommandKind::PlayMusic,
        CommandKind::StopMusic,
        CommandKind::NextDialog,
    ];

    /// Keywords are matched case-insensitively.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.keyword().eq_ignore_ascii_case(word))
    }

    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::SetBackground => "SET_BACKGROUND",
            CommandKind::ClearBackground => "CLEAR_BACKGROUND",
            CommandKind::SetCharacter => "SET_CHARACTER",
            CommandKind::ClearCharacterPosition => "CLEAR_CHARACTER_POSITION",
            CommandKind::ClearCharacterPositions => "CLEAR_CHARACTER_POSITIONS",
            CommandKind::End => "END",
            CommandKind::Assign => "ASSIGN",
            CommandKind::GoTo => "GO_TO",
            CommandKind::HideUi => "HIDE_UI",
            CommandKind::ShowUi => "SHOW_UI",
            CommandKind::PlaySound => "PLAY_SOUND",
            CommandKind::PlayMusic => "PLAY_MUSIC",
            CommandKind::StopMusic => "STOP_MUSIC",
            CommandKind::NextDialog => "NEXT_DIALOG",
        }
    }

    /// Usage string quoted in argument-shape errors.
    pub fn usage(self) -> &'static str {
        match self {
            CommandKind::SetBackground => "#SET_BACKGROUND \"pack\"::\"background\"",
            CommandKind::ClearBackground => "#CLEAR_BACKGROUND",
            CommandKind::SetCharacter => "#SET_CHARACTER position \"character\"::\"animation\"",
            CommandKind::ClearCharacterPosition => "#CLEAR_CHARACTER_POSITION position",
            CommandKind::ClearCharacterPositions => "#CLEAR_CHARACTER_POSITIONS",
            CommandKind::End => "#END",
            CommandKind::Assign => "#ASSIGN name expression",
            CommandKind::GoTo => "#GO_TO knot",
            CommandKind::HideUi => "#HIDE_UI",
            CommandKind::ShowUi => "#SHOW_UI",
            CommandKind::PlaySound => "#PLAY_SOUND \"effect\"",
            CommandKind::PlayMusic => "#PLAY_MUSIC \"track\"",
            CommandKind::StopMusic => "#STOP_MUSIC",
            CommandKind::NextDialog => "#NEXT_DIALOG \"script\"",
        }
    }

    /// Number of arguments the command takes.
    pub fn arity(self) -> usize {
        match self {
            CommandKind::ClearBackground
            | CommandKind::ClearCharacterPositions
            | CommandKind::End
            | CommandKind::HideUi
            | CommandKind::ShowUi
            | CommandKind::StopMusic => 0,
            CommandKind::ClearCharacterPosition
            | CommandKind::GoTo
            | CommandKind::PlaySound
            | CommandKind::PlayMusic
            | CommandKind::NextDialog => 1,
            CommandKind::SetBackground | CommandKind::Assign => 2,
            CommandKind::SetCharacter => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(CommandKind::from_keyword("assign"), Some(CommandKind::Assign));
        assert_eq!(CommandKind::from_keyword("Go_To"), Some(CommandKind::GoTo));
        assert_eq!(CommandKind::from_keyword("TELEPORT"), None);
    }

    #[test]
    fn every_usage_names_its_keyword() {
        for kind in CommandKind::ALL {
            assert!(kind.usage().starts_with(&format!("#{}", kind.keyword())));
        }
    }
}
