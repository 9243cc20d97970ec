use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::error::{DashError, Result};
use crate::exporter::write_report;
use crate::filter::FilterEngine;
use crate::fmt::money;
use crate::models::Selection;
use crate::reports::{RankedItem, TOP_CATEGORIES};
use crate::session::{Notice, NoticeLevel, Session, PROMPT_SELECT};
use crate::settings::{load_settings, shellexpand_path};
use crate::tui::{money_span, notice_style, BAR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

const TITLE: &str = "Franchise Performance Dashboard";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Focus {
    Franchises,
    Items,
}

/// A multi-select list: options, chosen indices and the cursor.
#[derive(Debug, Default)]
struct PickList {
    options: Vec<String>,
    chosen: BTreeSet<usize>,
    state: ListState,
}

impl PickList {
    fn new(options: Vec<String>) -> Self {
        let mut state = ListState::default();
        if !options.is_empty() {
            state.select(Some(0));
        }
        Self {
            options,
            chosen: BTreeSet::new(),
            state,
        }
    }

    fn cursor(&self) -> usize {
        self.state.selected().unwrap_or(0)
    }

    fn move_by(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() as isize - 1;
        let next = (self.cursor() as isize + delta).clamp(0, last);
        self.state.select(Some(next as usize));
    }

    fn toggle(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let i = self.cursor();
        if !self.chosen.remove(&i) {
            self.chosen.insert(i);
        }
    }

    fn select_all(&mut self) {
        self.chosen = (0..self.options.len()).collect();
    }

    fn clear(&mut self) {
        self.chosen.clear();
    }

    fn chosen_values(&self) -> Vec<String> {
        self.chosen
            .iter()
            .filter_map(|&i| self.options.get(i).cloned())
            .collect()
    }
}

struct Dashboard {
    file: PathBuf,
    export_dir: PathBuf,
    engine: FilterEngine,
    session: Session,
    franchises: PickList,
    items: PickList,
    focus: Focus,
    notice: Notice,
}

impl Dashboard {
    fn new(file: &Path, engine: FilterEngine, export_dir: PathBuf) -> Self {
        Self {
            file: file.to_path_buf(),
            export_dir,
            engine,
            session: Session::Empty,
            franchises: PickList::default(),
            items: PickList::default(),
            focus: Focus::Franchises,
            notice: Notice {
                level: NoticeLevel::Info,
                message: PROMPT_SELECT.to_string(),
            },
        }
    }

    /// Read the file again and start over from the new table.
    fn reload(&mut self) {
        let filename = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (session, notice) = match std::fs::read(&self.file) {
            Ok(bytes) => std::mem::take(&mut self.session).upload(&bytes, &filename),
            Err(e) => (
                Session::Empty,
                Notice {
                    level: NoticeLevel::Error,
                    message: format!("Error: cannot read {}: {e}", self.file.display()),
                },
            ),
        };
        let (franchises, items) = session
            .table()
            .map(|t| (t.franchises(), t.items()))
            .unwrap_or_default();
        self.franchises = PickList::new(franchises);
        self.items = PickList::new(items);
        self.session = session;
        self.notice = notice;
    }

    fn selection(&self) -> Selection {
        Selection::new(self.franchises.chosen_values(), self.items.chosen_values())
    }

    fn reselect(&mut self) {
        let selection = self.selection();
        let (session, notice) = std::mem::take(&mut self.session).select(&self.engine, selection);
        self.session = session;
        self.notice = notice;
    }

    fn export(&mut self) {
        let result = self
            .session
            .export()
            .and_then(|bytes| write_report(&self.export_dir, &bytes));
        self.notice = match result {
            Ok(path) => Notice {
                level: NoticeLevel::Success,
                message: format!("Wrote {}", path.display()),
            },
            Err(DashError::NoSelection) => Notice {
                level: NoticeLevel::Info,
                message: PROMPT_SELECT.to_string(),
            },
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                Notice {
                    level: NoticeLevel::Error,
                    message: format!("Error: {e}"),
                }
            }
        };
    }

    fn focused(&mut self) -> &mut PickList {
        match self.focus {
            Focus::Franchises => &mut self.franchises,
            Focus::Items => &mut self.items,
        }
    }

    /// Returns false when the dashboard should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Up | KeyCode::Char('k') => self.focused().move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.focused().move_by(1),
            KeyCode::PageUp => self.focused().move_by(-10),
            KeyCode::PageDown => self.focused().move_by(10),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Franchises => Focus::Items,
                    Focus::Items => Focus::Franchises,
                };
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.focused().toggle();
                self.reselect();
            }
            KeyCode::Char('a') => {
                self.focused().select_all();
                self.reselect();
            }
            KeyCode::Char('c') => {
                self.focused().clear();
                self.reselect();
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        true
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, body_area, notice_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {TITLE}  ·  {}", self.file.display())).style(HEADER_STYLE),
            header_area,
        );
        let sep_line = "━".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(sep_line).style(Style::default().fg(Color::DarkGray)),
            sep,
        );

        let [filters_area, content_area] =
            Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)])
                .areas(body_area);
        let [franchise_area, item_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(filters_area);

        let franchise_focus = self.focus == Focus::Franchises;
        draw_pick_list(frame, franchise_area, "Franchises", &mut self.franchises, franchise_focus);
        draw_pick_list(frame, item_area, "Items (optional)", &mut self.items, !franchise_focus);

        self.draw_content(frame, content_area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.notice.message))
                .style(notice_style(self.notice.level)),
            notice_area,
        );
        frame.render_widget(
            Paragraph::new(
                " Up/Down=move  Space=toggle  a=all  c=clear  Tab=switch list  e=export  r=reload  q=quit",
            )
            .style(FOOTER_STYLE),
            hints_area,
        );
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let Some(summary) = self.session.summary() else {
            frame.render_widget(
                Paragraph::new(vec![Line::from(""), Line::from(format!(" {PROMPT_SELECT}"))])
                    .style(FOOTER_STYLE),
                area,
            );
            return;
        };

        let [cards_area, charts_area] =
            Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let cards = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(" Revenue total        ", bold),
                money_span(summary.total),
            ]),
            Line::from(vec![
                Span::styled(" Franchises analyzed  ", bold),
                Span::raw(summary.franchises_analyzed.to_string()),
            ]),
            Line::from(vec![
                Span::styled(" Rows                 ", bold),
                Span::raw(summary.row_count.to_string()),
            ]),
        ];
        frame.render_widget(Paragraph::new(cards), cards_area);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(charts_area);
        frame.render_widget(ranking_chart("Revenue by franchise", &summary.by_franchise), left);
        frame.render_widget(
            ranking_chart(
                &format!("Top {TOP_CATEGORIES} categories"),
                &summary.top_categories,
            ),
            right,
        );
    }
}

fn draw_pick_list(frame: &mut Frame, area: Rect, title: &str, list: &mut PickList, focused: bool) {
    let items: Vec<ListItem> = list
        .options
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mark = if list.chosen.contains(&i) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {name}"))
        })
        .collect();
    let border = if focused {
        Style::default().fg(Color::Rgb(52, 211, 21))
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(format!(" {title} ({}/{}) ", list.chosen.len(), list.options.len()))
        .borders(Borders::ALL)
        .border_style(border);
    let widget = List::new(items)
        .block(block)
        .highlight_style(if focused { SELECTED_STYLE } else { Style::default() });
    frame.render_stateful_widget(widget, area, &mut list.state);
}

fn ranking_chart<'a>(title: &str, items: &'a [RankedItem]) -> BarChart<'a> {
    let bars: Vec<Bar> = items
        .iter()
        .map(|item| {
            Bar::default()
                .value(item.total.max(0.0).round() as u64)
                .label(Line::from(item.name.as_str()))
                .text_value(money(item.total))
                .style(BAR_STYLE)
        })
        .collect();
    BarChart::default()
        .block(
            Block::default()
                .title(format!(" {title} "))
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars))
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(file: &str) -> Result<()> {
    let settings = load_settings();
    let engine = FilterEngine::new(&settings.excluded_categories)?;
    let mut dashboard = Dashboard::new(
        Path::new(file),
        engine,
        shellexpand_path(&settings.export_dir),
    );
    dashboard.reload();

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(DashError::Terminal(e.to_string()));
        }
        match event::read() {
            Err(e) => break Err(DashError::Terminal(e.to_string())),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                if !dashboard.handle_key(key.code) {
                    break Ok(());
                }
            }
            Ok(_) => {}
        }
    };
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_EXCLUDED_CATEGORIES;

    const CSV: &str = "Data Emissao,R$ Total,FRANQUIA,Categoria,Descrição Item\n\
                       14/03/2025,100,Centro,Copos,Copo\n\
                       14/03/2025,50,Norte,CAIXA DE PIZZA,Caixa\n\
                       15/03/2025,25,Norte,Tampas,Tampa\n";

    fn dashboard(dir: &Path) -> Dashboard {
        let file = dir.join("itens.csv");
        std::fs::write(&file, CSV).unwrap();
        let engine = FilterEngine::new(DEFAULT_EXCLUDED_CATEGORIES).unwrap();
        let mut d = Dashboard::new(&file, engine, dir.join("out"));
        d.reload();
        d
    }

    #[test]
    fn test_reload_populates_pick_lists() {
        let dir = tempfile::tempdir().unwrap();
        let d = dashboard(dir.path());
        assert_eq!(d.franchises.options, vec!["Centro", "Norte"]);
        assert_eq!(d.items.options, vec!["Caixa", "Copo", "Tampa"]);
        assert_eq!(d.notice.level, NoticeLevel::Success);
    }

    #[test]
    fn test_toggle_franchise_filters_and_summarizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(dir.path());
        d.handle_key(KeyCode::Down);
        d.handle_key(KeyCode::Char(' '));
        let summary = d.session.summary().unwrap();
        assert_eq!(summary.total, 25.0);
        assert_eq!(summary.by_franchise[0].name, "Norte");
    }

    #[test]
    fn test_clear_returns_to_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(dir.path());
        d.handle_key(KeyCode::Char('a'));
        assert_eq!(d.session.summary().unwrap().total, 125.0);
        d.handle_key(KeyCode::Char('c'));
        assert!(d.session.summary().is_none());
        assert_eq!(d.notice.message, PROMPT_SELECT);
    }

    #[test]
    fn test_export_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(dir.path());
        d.handle_key(KeyCode::Char('e'));
        assert_eq!(d.notice.level, NoticeLevel::Info);
        d.handle_key(KeyCode::Char('a'));
        d.handle_key(KeyCode::Char('e'));
        assert_eq!(d.notice.level, NoticeLevel::Success);
        assert!(dir
            .path()
            .join("out")
            .join(crate::exporter::REPORT_FILENAME)
            .exists());
    }

    #[test]
    fn test_missing_file_leaves_session_empty() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FilterEngine::new(DEFAULT_EXCLUDED_CATEGORIES).unwrap();
        let mut d = Dashboard::new(&dir.path().join("gone.csv"), engine, dir.path().to_path_buf());
        d.reload();
        assert!(matches!(d.session, Session::Empty));
        assert_eq!(d.notice.level, NoticeLevel::Error);
        assert!(d.franchises.options.is_empty());
        assert!(d.handle_key(KeyCode::Char(' ')));
    }

    #[test]
    fn test_quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(dir.path());
        assert!(!d.handle_key(KeyCode::Char('q')));
        assert!(!d.handle_key(KeyCode::Esc));
    }
}
