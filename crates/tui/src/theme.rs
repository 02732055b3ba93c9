use ratatui::style::Color;

pub struct Theme {
    pub border_focus: Color,
    pub border_inactive: Color,
    pub viewer_border: Color,
    pub history_selected_fg: Color,
    pub history_selected_bg: Color,
    pub warning_fg: Color,
}

pub const THEME: Theme = Theme {
    border_focus: Color::Cyan,
    border_inactive: Color::DarkGray,
    viewer_border: Color::DarkGray,
    history_selected_fg: Color::Black,
    history_selected_bg: Color::Cyan,
    warning_fg: Color::Yellow,
};
