//! Vertical tank fill bar, drawn bottom-up in the band color.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};

use tankwatch_core::GaugeView;

use crate::theme;

pub struct FillBar<'a> {
    view: GaugeView,
    block: Option<Block<'a>>,
}

impl<'a> FillBar<'a> {
    pub fn new(view: GaugeView) -> Self {
        Self { view, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for FillBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if area.is_empty() {
            return;
        }

        let filled = u16::try_from(self.view.filled_cells(usize::from(area.height)))
            .unwrap_or(area.height);
        let fill = Style::default().fg(theme::band_color(self.view.band));
        let empty = Style::default().fg(theme::EMPTY_CELL);

        for row in 0..area.height {
            let y = area.bottom() - 1 - row;
            let (symbol, style) = if row < filled { ("█", fill) } else { ("░", empty) };
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(symbol).set_style(style);
                }
            }
        }
    }
}
