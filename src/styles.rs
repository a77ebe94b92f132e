use crate::ranking::RankTier;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder};

pub const PRIMARY: u32 = 0x118DFF;
pub const SUCCESS: u32 = 0x30B177;
pub const ACCENT_ORANGE: u32 = 0xE66C37;
pub const ACCENT_PURPLE: u32 = 0x6B007B;
pub const ACCENT_PINK: u32 = 0xE044A7;
pub const ACCENT_VIOLET: u32 = 0x744EC2;
pub const SECONDARY: u32 = 0x12239E;
pub const WARNING: u32 = 0xD9B300;

const FONT: &str = "Segoe UI";
const FONT_SEMIBOLD: &str = "Segoe UI Semibold";
const TEXT_DARK: u32 = 0x252423;
const TEXT_MUTED: u32 = 0x888888;
const PAGE_BACKGROUND: u32 = 0xF5F5F5;
const WHITE: u32 = 0xFFFFFF;

/// Reusable cell formats for the three sheets
pub struct Styles {
    pub data_header: Format,
    pub data_text: Format,
    pub data_number: Format,
    pub section_title: Format,
    pub background: Format,
    pub title: Format,
    pub subtitle: Format,
    pub section_header: Format,
    pub kpi_title: Format,
    pub kpi_pad: Format,
    pub footer: Format,
}

impl Styles {
    pub fn new() -> Self {
        let data_header = Format::new()
            .set_font_name(FONT)
            .set_font_size(10)
            .set_bold()
            .set_font_color(WHITE)
            .set_background_color(PRIMARY)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(0xCCCCCC);

        let data_text = Format::new()
            .set_font_name(FONT)
            .set_font_size(10)
            .set_font_color(TEXT_DARK)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(0xDDDDDD);

        let data_number = data_text.clone().set_num_format("General");

        let section_title = Format::new()
            .set_font_name(FONT)
            .set_font_size(12)
            .set_bold()
            .set_font_color(PRIMARY);

        let background = Format::new().set_background_color(PAGE_BACKGROUND);

        let title = Format::new()
            .set_font_name(FONT)
            .set_font_size(32)
            .set_bold()
            .set_font_color(PRIMARY)
            .set_background_color(PAGE_BACKGROUND)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let subtitle = Format::new()
            .set_font_name(FONT)
            .set_font_size(11)
            .set_italic()
            .set_font_color(TEXT_MUTED)
            .set_background_color(PAGE_BACKGROUND)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let section_header = Format::new()
            .set_font_name(FONT_SEMIBOLD)
            .set_font_size(14)
            .set_bold()
            .set_font_color(TEXT_DARK)
            .set_background_color(PAGE_BACKGROUND)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter);

        let kpi_title = Format::new()
            .set_font_name(FONT)
            .set_font_size(9)
            .set_font_color(TEXT_MUTED)
            .set_background_color(WHITE)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(0xE0E0E0);

        let kpi_pad = Format::new()
            .set_background_color(WHITE)
            .set_border(FormatBorder::Thin)
            .set_border_color(0xE0E0E0);

        let footer = Format::new()
            .set_font_name(FONT)
            .set_font_size(9)
            .set_italic()
            .set_font_color(0xAAAAAA)
            .set_background_color(PAGE_BACKGROUND)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        Styles {
            data_header,
            data_text,
            data_number,
            section_title,
            background,
            title,
            subtitle,
            section_header,
            kpi_title,
            kpi_pad,
            footer,
        }
    }

    /// Coloured strip across the top of a KPI card
    pub fn kpi_accent(&self, color: u32) -> Format {
        Format::new().set_background_color(color)
    }

    pub fn kpi_value(&self, color: u32, num_format: &str) -> Format {
        Format::new()
            .set_font_name(FONT_SEMIBOLD)
            .set_font_size(26)
            .set_bold()
            .set_font_color(color)
            .set_num_format(num_format)
            .set_background_color(WHITE)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(0xE0E0E0)
    }

    /// Cell of the top performers table, shaded by tier
    pub fn rank_cell(&self, tier: RankTier, num_format: &str) -> Format {
        let mut format = Format::new()
            .set_font_name(FONT)
            .set_font_size(10)
            .set_font_color(tier.font_color())
            .set_background_color(tier.fill_color())
            .set_num_format(num_format)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(0xE0E0E0);
        if tier.is_podium() {
            format = format.set_bold();
        }
        format
    }

    pub fn insight_label(&self, color: u32) -> Format {
        Format::new()
            .set_font_name(FONT)
            .set_font_size(9)
            .set_font_color(TEXT_MUTED)
            .set_background_color(WHITE)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_border_left(FormatBorder::Medium)
            .set_border_left_color(color)
            .set_border_bottom(FormatBorder::Thin)
            .set_border_bottom_color(0xF0F0F0)
    }

    pub fn insight_value(&self, color: u32, num_format: &str) -> Format {
        Format::new()
            .set_font_name(FONT_SEMIBOLD)
            .set_font_size(12)
            .set_bold()
            .set_font_color(color)
            .set_num_format(num_format)
            .set_background_color(WHITE)
            .set_align(FormatAlign::Right)
            .set_align(FormatAlign::VerticalCenter)
            .set_border_bottom(FormatBorder::Thin)
            .set_border_bottom_color(0xF0F0F0)
    }

    pub fn insight_pad(&self) -> Format {
        Format::new()
            .set_background_color(WHITE)
            .set_border_bottom(FormatBorder::Thin)
            .set_border_bottom_color(0xF0F0F0)
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::new()
    }
}
