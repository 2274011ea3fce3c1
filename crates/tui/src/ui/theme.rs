use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub text: Color,
    pub text_muted: Color,
    pub dim: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub border_focused: Color,
    pub surface_bright: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::Rgb(222, 222, 218),
            text_muted: Color::Rgb(150, 152, 150),
            dim: Color::Rgb(110, 112, 110),
            accent: Color::Rgb(96, 170, 210),
            positive: Color::Rgb(110, 190, 120),
            negative: Color::Rgb(220, 110, 100),
            warning: Color::Rgb(225, 180, 90),
            error: Color::Rgb(210, 80, 80),
            border: Color::Rgb(60, 66, 72),
            border_focused: Color::Rgb(96, 170, 210),
            surface_bright: Color::Rgb(22, 26, 30),
        }
    }
}
