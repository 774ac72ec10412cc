use ratatui::layout::{Constraint, Layout, Rect};

/// Top-level screen regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub header: Rect,
    pub banner: Option<Rect>,
    pub body: Rect,
    pub status: Rect,
}

pub fn screen(area: Rect, with_banner: bool) -> Screen {
    if with_banner {
        let [header, banner, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);
        Screen {
            header,
            banner: Some(banner),
            body,
            status,
        }
    } else {
        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);
        Screen {
            header,
            banner: None,
            body,
            status,
        }
    }
}

/// Regions of the URL list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAreas {
    pub input: Rect,
    pub table: Rect,
    pub footer: Rect,
}

pub fn list_page(body: Rect) -> ListAreas {
    let [input, table, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(body);
    ListAreas {
        input,
        table,
        footer,
    }
}

/// Splits the input row into the text box and the submit button.
pub fn input_row(area: Rect) -> (Rect, Rect) {
    let [text, button] =
        Layout::horizontal([Constraint::Min(10), Constraint::Length(18)]).areas(area);
    (text, button)
}

/// Regions of a loaded detail report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailAreas {
    pub summary: Rect,
    pub headings: Rect,
    pub links: Rect,
    pub broken: Rect,
}

pub fn detail_page(body: Rect) -> DetailAreas {
    let [summary, middle, broken] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(8),
        Constraint::Percentage(35),
    ])
    .areas(body);
    let [headings, links] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(middle);
    DetailAreas {
        summary,
        headings,
        links,
        broken,
    }
}

pub fn list_columns() -> [Constraint; 10] {
    [
        Constraint::Length(3),
        Constraint::Length(5),
        Constraint::Min(24),
        Constraint::Length(20),
        Constraint::Length(10),
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(19),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_takes_room_from_the_body() {
        let area = Rect::new(0, 0, 80, 24);
        let plain = screen(area, false);
        let with_banner = screen(area, true);

        assert_eq!(plain.banner, None);
        assert_eq!(with_banner.banner.map(|r| r.height), Some(3));
        assert_eq!(plain.body.height, with_banner.body.height + 3);
        assert_eq!(with_banner.status.y, 23);
    }
}
