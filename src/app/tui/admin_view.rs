use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use super::super::admin::EditField;
use super::super::admin::analytics::Remote;
use super::super::catalog::format_category_name;
use super::super::episode::truncate;
use super::super::root::Root;
use super::InputMode;
use super::render::{
    Palette, centered_fixed_rect, draw_status, modal_block, panel_block, render_popup_shadow,
};

pub(super) fn draw_admin(frame: &mut Frame, root: &Root, input: &InputMode, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "ADMIN DASHBOARD",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} episodes", root.episodes().len()),
            Style::default().fg(palette.muted),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Podcast English", palette));
    frame.render_widget(header, chunks[0]);

    if !root.admin().authenticated {
        draw_status(frame, chunks[3], root, palette);
        let password = match input {
            InputMode::AdminLogin(password) => password.as_str(),
            _ => "",
        };
        draw_login(frame, password, palette);
        return;
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(5)])
        .split(body[1]);

    draw_episode_table(frame, body[0], root, palette);
    draw_analytics(frame, side[0], root, palette);
    draw_visitor_log(frame, side[1], root, palette);

    let hints = Paragraph::new(Span::styled(
        "↑/↓ select  enter edit  w save to file  P password  L support link  I support image  \
         esc back to app  q quit",
        Style::default().fg(palette.muted),
    ))
    .wrap(Wrap { trim: true })
    .block(panel_block("Controls", palette));
    frame.render_widget(hints, chunks[2]);
    draw_status(frame, chunks[3], root, palette);

    if root.admin().editor.is_some() {
        draw_editor(frame, root, palette);
    }
    match input {
        InputMode::ChangePassword(form) => {
            let fields = [
                ("New password", mask(&form.new), !form.on_confirm),
                ("Confirm password", mask(&form.confirm), form.on_confirm),
            ];
            draw_form(frame, "Change Password", &fields, "tab switch  enter submit  esc cancel", palette);
        }
        InputMode::SupportLink(link) => {
            let fields = [("Payment link", link.clone(), true)];
            draw_form(frame, "Support Link", &fields, "enter save  esc cancel", palette);
        }
        InputMode::SupportImage(path) => {
            let fields = [("Image file path", path.clone(), true)];
            draw_form(frame, "Support Image", &fields, "enter upload  esc cancel", palette);
        }
        _ => {}
    }
}

fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

fn draw_login(frame: &mut Frame, password: &str, palette: &Palette) {
    let fields = [("Password", mask(password), true)];
    draw_form(frame, "Admin Login", &fields, "enter login  esc back to app", palette);
}

/// A popup of labelled single-line fields; the active one shows a cursor.
fn draw_form(
    frame: &mut Frame,
    title: &str,
    fields: &[(&str, String, bool)],
    hint: &str,
    palette: &Palette,
) {
    let mut lines = Vec::new();
    for (label, value, active) in fields {
        lines.push(Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(palette.muted),
        )));
        let (text, style) = if *active {
            (
                format!("{value}▏"),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (value.clone(), Style::default().fg(palette.text))
        };
        lines.push(Line::from(Span::styled(text, style)));
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        hint.to_string(),
        Style::default().fg(palette.muted),
    )));

    let height = (fields.len() as u16) * 3 + 5;
    let popup_area = centered_fixed_rect(56, height, frame.area());
    render_popup_shadow(frame, popup_area, palette);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(lines)
        .style(Style::default().fg(palette.text).bg(palette.bg))
        .wrap(Wrap { trim: false })
        .block(modal_block(title.to_string(), palette));
    frame.render_widget(popup, popup_area);
}

fn draw_editor(frame: &mut Frame, root: &Root, palette: &Palette) {
    let Some(editor) = root.admin().editor.as_ref() else {
        return;
    };
    let fields: Vec<(&str, String, bool)> = [EditField::Title, EditField::Description, EditField::Folder]
        .into_iter()
        .map(|field| (field.label(), editor.value(field).to_string(), field == editor.field))
        .collect();
    draw_form(
        frame,
        &format!("Edit episode #{}", editor.id),
        &fields,
        "tab next field  enter save  esc cancel",
        palette,
    );
}

fn draw_episode_table(frame: &mut Frame, area: Rect, root: &Root, palette: &Palette) {
    let rows: Vec<Row> = root
        .episodes()
        .iter()
        .map(|episode| {
            Row::new(vec![
                Cell::from(episode.id.to_string()),
                Cell::from(truncate(&episode.title, 40)),
                Cell::from(format_category_name(&episode.folder)),
                Cell::from(episode.level.clone()),
            ])
            .style(Style::default().fg(palette.text))
        })
        .collect();
    let header = Row::new(vec!["ID", "Title", "Category", "Level"]).style(
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(panel_block("Episodes", palette))
    .row_highlight_style(
        Style::default()
            .bg(palette.accent)
            .fg(palette.bg)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    let selected = (!root.episodes().is_empty()).then_some(root.admin().cursor);
    let mut state = TableState::default().with_selected(selected);
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_analytics(frame: &mut Frame, area: Rect, root: &Root, palette: &Palette) {
    let analytics = root.analytics();
    let support = root.support();
    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<15}"), Style::default().fg(palette.muted)),
            Span::styled(value, Style::default().fg(palette.text)),
        ])
    };
    let lines = vec![
        row("Total visits", analytics.visits_label()),
        row("Your IP", analytics.ip_label()),
        row("Support link", truncate(&support.link, 48)),
        row("Support image", support.image_summary()),
    ];
    let panel = Paragraph::new(lines).block(panel_block("Analytics", palette));
    frame.render_widget(panel, area);
}

fn draw_visitor_log(frame: &mut Frame, area: Rect, root: &Root, palette: &Palette) {
    let block = panel_block("Recent Visitors", palette);
    let entries = match &root.analytics().visitor_log {
        Remote::Loading => {
            let loading = Paragraph::new("Loading...")
                .style(Style::default().fg(palette.muted))
                .block(block);
            frame.render_widget(loading, area);
            return;
        }
        Remote::Ready(entries) if entries.is_empty() => {
            let empty = Paragraph::new("No logs found yet.")
                .style(Style::default().fg(palette.muted))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }
        Remote::Ready(entries) => entries,
    };

    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.display_time()),
                Cell::from(entry.ip.clone()),
                Cell::from(entry.path.clone()),
            ])
            .style(Style::default().fg(palette.text))
        })
        .collect();
    let header = Row::new(vec!["Time", "IP", "Page"]).style(
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Length(16),
            Constraint::Min(6),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}
