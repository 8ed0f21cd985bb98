//! Desired display content, as handed in by profile code
//!
//! These are plain values: the registry stores the latest one per device and
//! the device turns it into frames on the next paced flush. Every type
//! compares by value so unchanged content is never resent.

use serde::{Deserialize, Serialize};

/// FCU windows and annunciator flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FcuDisplay {
    pub speed: String,
    pub heading: String,
    pub altitude: String,
    pub vertical_speed: String,

    pub enabled: bool,
    /// All segments lit
    pub test: bool,

    pub spd_mach: bool,
    pub hdg_trk: bool,
    pub alt_managed: bool,
    pub spd_managed: bool,
    pub hdg_managed: bool,
    pub vs_mode: bool,
    pub fpa_mode: bool,
    pub lat_mode: bool,
    pub alt_indication: bool,
    pub vs_horizontal_line: bool,
    pub vs_vertical_line: bool,
    pub lvl_change: bool,
    pub lvl_change_left: bool,
    pub lvl_change_right: bool,
    pub vs_indication: bool,
    pub fpa_indication: bool,
    /// Decimal point after the first vertical speed digit (X.XX)
    pub fpa_comma: bool,
    /// Vertical speed sign: true = positive
    pub vs_sign: bool,
}

impl Default for FcuDisplay {
    fn default() -> Self {
        Self {
            speed: String::new(),
            heading: String::new(),
            altitude: String::new(),
            vertical_speed: String::new(),
            enabled: true,
            test: false,
            spd_mach: false,
            hdg_trk: false,
            alt_managed: false,
            spd_managed: false,
            hdg_managed: false,
            vs_mode: false,
            fpa_mode: false,
            lat_mode: false,
            alt_indication: true,
            vs_horizontal_line: true,
            vs_vertical_line: false,
            lvl_change: true,
            lvl_change_left: true,
            lvl_change_right: true,
            vs_indication: false,
            fpa_indication: false,
            fpa_comma: false,
            vs_sign: true,
        }
    }
}

impl FcuDisplay {
    /// Everything dark
    pub fn blank() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Which EFIS side panel a display update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfisSide {
    Left,
    Right,
}

/// EFIS baro window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfisDisplay {
    /// Right-aligned 4-character baro value
    pub baro: String,
    /// Unit is inHg (shows the decimal point)
    pub inhg: bool,
    /// Shows "STD" instead of the baro value
    pub std: bool,
    pub qfe: bool,
    pub enabled: bool,
    pub test: bool,
}

impl Default for EfisDisplay {
    fn default() -> Self {
        Self {
            baro: String::new(),
            inhg: false,
            std: false,
            qfe: false,
            enabled: true,
            test: false,
        }
    }
}

impl EfisDisplay {
    pub fn blank() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the baro value from a pressure in inHg
    ///
    /// Shown as inHg × 100 (`2992`) or converted to hPa (`1013`). Leaves STD
    /// mode.
    pub fn set_baro(&mut self, value_inhg: f32, in_hg: bool) {
        let factor = if in_hg { 100.0 } else { 33.8639 };
        let value = (value_inhg * factor).round() as i32;
        self.baro = format!("{:>4}", value);
        self.inhg = in_hg;
        self.std = false;
    }
}

/// PAP3 MCP LCD content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpDisplay {
    /// IAS in knots, or Mach (values below 100 are shown as Mach)
    pub speed: f32,
    pub heading: i32,
    pub altitude: i32,
    pub vertical_speed: f32,
    pub crs_capt: i32,
    pub crs_fo: i32,

    pub speed_visible: bool,
    pub heading_visible: bool,
    pub vertical_speed_visible: bool,
    pub show_course: bool,

    pub enabled: bool,
    pub test: bool,

    pub show_labels: bool,
    pub show_dashes_when_inactive: bool,
    pub show_labels_when_inactive: bool,

    /// Special 'A' digit in front of the speed
    pub digit_a: bool,
    /// Special '8' digit in front of the speed
    pub digit_b: bool,
}

impl Default for McpDisplay {
    fn default() -> Self {
        Self {
            speed: 0.0,
            heading: 0,
            altitude: 0,
            vertical_speed: 0.0,
            crs_capt: 0,
            crs_fo: 0,
            speed_visible: true,
            heading_visible: true,
            vertical_speed_visible: true,
            show_course: true,
            enabled: true,
            test: false,
            show_labels: false,
            show_dashes_when_inactive: false,
            show_labels_when_inactive: false,
            digit_a: false,
            digit_b: false,
        }
    }
}

impl McpDisplay {
    pub fn blank() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// CDU screen rows
pub const CDU_ROWS: usize = 14;
/// CDU screen columns
pub const CDU_COLUMNS: usize = 24;

/// One character cell of the CDU screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CduCell {
    /// Character byte (ASCII, plus 0x1E/0x1F for the small up/down arrows)
    pub ch: u8,
    /// Colour letter: L A W B G M R Y E
    pub color: char,
    pub small: bool,
}

impl Default for CduCell {
    fn default() -> Self {
        Self {
            ch: b' ',
            color: 'W',
            small: false,
        }
    }
}

/// Full CDU screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CduPage {
    rows: Vec<Vec<CduCell>>,
}

impl Default for CduPage {
    fn default() -> Self {
        Self {
            rows: vec![vec![CduCell::default(); CDU_COLUMNS]; CDU_ROWS],
        }
    }
}

impl CduPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CduCell> {
        self.rows.get(row)?.get(column)
    }

    pub fn set_cell(&mut self, row: usize, column: usize, cell: CduCell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *slot = cell;
        }
    }

    /// Write `text` starting at `column`; characters past the edge are cut
    pub fn write_text(&mut self, row: usize, column: usize, text: &str, color: char, small: bool) {
        for (i, ch) in text.bytes().enumerate() {
            self.set_cell(row, column + i, CduCell { ch, color, small });
        }
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &CduCell> {
        self.rows.iter().flat_map(|row| row.iter())
    }
}

/// Display update for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFields {
    Fcu(FcuDisplay),
    Efis { side: EfisSide, display: EfisDisplay },
    Mcp(McpDisplay),
    Cdu(CduPage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_baro_hpa_and_inhg() {
        let mut efis = EfisDisplay {
            std: true,
            ..EfisDisplay::default()
        };
        efis.set_baro(29.92, false);
        assert_eq!(efis.baro, "1013");
        assert!(!efis.inhg);
        assert!(!efis.std);

        efis.set_baro(29.92, true);
        assert_eq!(efis.baro, "2992");
        assert!(efis.inhg);
    }

    #[test]
    fn test_set_baro_right_aligns_short_values() {
        let mut efis = EfisDisplay::default();
        efis.set_baro(9.99, true);
        assert_eq!(efis.baro, " 999");
    }

    #[test]
    fn test_cdu_page_write_text_clips() {
        let mut page = CduPage::new();
        page.write_text(0, 22, "ABC", 'G', true);
        assert_eq!(page.cell(0, 22).map(|c| c.ch), Some(b'A'));
        assert_eq!(page.cell(0, 23).map(|c| c.color), Some('G'));
        assert!(page.cell(0, 24).is_none());
        assert_eq!(page.cells().count(), CDU_ROWS * CDU_COLUMNS);
    }

    #[test]
    fn test_fcu_defaults() {
        let fcu = FcuDisplay::default();
        assert!(fcu.enabled);
        assert!(fcu.alt_indication);
        assert!(fcu.vs_sign);
        assert!(!FcuDisplay::blank().enabled);
    }

    #[test]
    fn test_display_fields_yaml() {
        let yaml = "efis:\n  side: left\n  display:\n    baro: '1013'\n";
        let fields: DisplayFields = serde_yaml::from_str(yaml).unwrap();
        match fields {
            DisplayFields::Efis { side, display } => {
                assert_eq!(side, EfisSide::Left);
                assert_eq!(display.baro, "1013");
                assert!(display.enabled);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
