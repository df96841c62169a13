use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Gauge, Padding, Paragraph, Row, Table, TableState,
    Wrap,
};

use super::super::admin::AppMode;
use super::super::catalog::format_category_name;
use super::super::episode::{Episode, VocabularyItem, truncate};
use super::super::flashcards::FlashcardDeck;
use super::super::playback::format_time;
use super::super::root::{Modal, Root};
use super::super::theme::Appearance;
use super::super::transcript::{category_badge, display_word, subcategory_badge};
use super::admin_view::draw_admin;
use super::InputMode;

#[derive(Debug, Clone, Copy)]
pub(super) struct Palette {
    pub(super) appearance: Appearance,
    pub(super) bg: Color,
    pub(super) text: Color,
    pub(super) muted: Color,
    pub(super) accent: Color,
    pub(super) border: Color,
    pub(super) modal_border: Color,
    pub(super) error: Color,
    pub(super) info: Color,
    pub(super) shadow: Color,
    pub(super) pill_bg: Color,
    pub(super) pill_fg: Color,
    pub(super) on: Color,
}

impl Palette {
    pub(super) fn for_appearance(appearance: Appearance) -> Self {
        match appearance {
            Appearance::Dark => Self {
                appearance,
                bg: Color::Black,
                text: Color::Rgb(230, 230, 230),
                muted: Color::Rgb(185, 195, 210),
                accent: Color::Rgb(110, 170, 255),
                border: Color::Rgb(125, 135, 150),
                modal_border: Color::Rgb(160, 190, 235),
                error: Color::Rgb(255, 145, 120),
                info: Color::Rgb(205, 165, 255),
                shadow: Color::Rgb(14, 16, 24),
                pill_bg: Color::Rgb(72, 82, 96),
                pill_fg: Color::Rgb(230, 235, 242),
                on: Color::Rgb(29, 185, 84),
            },
            Appearance::Light => Self {
                appearance,
                bg: Color::Rgb(250, 250, 250),
                text: Color::Rgb(31, 41, 55),
                muted: Color::Rgb(95, 105, 120),
                accent: Color::Rgb(30, 100, 200),
                border: Color::Rgb(170, 178, 190),
                modal_border: Color::Rgb(60, 110, 190),
                error: Color::Rgb(185, 45, 30),
                info: Color::Rgb(115, 60, 185),
                shadow: Color::Rgb(205, 208, 215),
                pill_bg: Color::Rgb(226, 232, 240),
                pill_fg: Color::Rgb(31, 41, 55),
                on: Color::Rgb(23, 148, 67),
            },
        }
    }
}

pub(super) fn draw_tui(frame: &mut Frame, root: &Root, input: &InputMode) {
    let palette = Palette::for_appearance(root.theme().appearance());
    let bg = Block::default().style(Style::default().bg(palette.bg).fg(palette.text));
    frame.render_widget(bg, frame.area());

    match root.mode() {
        AppMode::Admin => draw_admin(frame, root, input, &palette),
        AppMode::App => draw_main(frame, root, input, &palette),
    }

    if let Some(modal) = root.modal() {
        draw_modal(frame, modal, root, &palette);
    }
}

fn draw_main(frame: &mut Frame, root: &Root, input: &InputMode, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], root, input, palette);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);
    let detail = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(body[0]);

    match root.selected_episode() {
        Some(episode) => {
            draw_episode_header(frame, detail[0], root, episode, palette);
            draw_transcript(frame, detail[1], root, episode, palette);
        }
        None => {
            let empty = Paragraph::new("No episode\n\nThere is nothing to play yet.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(palette.muted))
                .block(panel_block("Episode", palette));
            frame.render_widget(empty, detail[0].union(detail[1]));
        }
    }
    draw_player(frame, detail[2], detail[3], root, palette);
    draw_episode_list(frame, body[1], root, input, palette);

    let hints = Paragraph::new(Line::from(Span::styled(
        "space play  ←/→ 10s  0-9 seek  +/- vol  r speed  l loop  a auto-next  n/p episode  \
         enter open  / search  F filter  tab category  f fav  t transcript  v cards  ? help  \
         s support  T theme  A admin  q quit",
        Style::default().fg(palette.muted),
    )))
    .wrap(Wrap { trim: true })
    .block(panel_block("Controls", palette));
    frame.render_widget(hints, chunks[2]);

    draw_status(frame, chunks[3], root, palette);
}

fn draw_header(frame: &mut Frame, area: Rect, root: &Root, input: &InputMode, palette: &Palette) {
    let searching = *input == InputMode::Search;
    let search_text = if searching {
        format!("{}▏", root.search())
    } else if root.search().is_empty() {
        "press / to search".to_string()
    } else {
        root.search().to_string()
    };
    let search_style = if searching {
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.muted)
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "PODLEARN",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(format!("{} episodes", root.episodes().len()), Style::default().fg(palette.muted)),
        Span::raw("   "),
        Span::styled("Search: ", Style::default().fg(palette.text)),
        Span::styled(search_text, search_style),
        Span::raw("   "),
        Span::styled(
            format!("theme {}", root.theme().theme().as_str()),
            Style::default().fg(palette.muted),
        ),
        Span::raw("   "),
        Span::styled(
            root.navigator().history().query_string(),
            Style::default().fg(palette.muted),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Podcast English", palette));
    frame.render_widget(header, area);
}

fn draw_episode_header(frame: &mut Frame, area: Rect, root: &Root, episode: &Episode, palette: &Palette) {
    let progress = root.progress();
    let nav = root.navigator();

    let mut title = vec![Span::styled(
        episode.title.clone(),
        Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
    )];
    if progress.is_favorite(episode.id) {
        title.push(Span::styled("  ★ favorite", Style::default().fg(Color::Rgb(250, 204, 21))));
    }
    if progress.is_completed(episode.id) {
        title.push(Span::styled("  ✓ completed", Style::default().fg(palette.on)));
    }

    let nav_style = |enabled: bool| {
        if enabled {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.border).add_modifier(Modifier::DIM)
        }
    };

    let lines = vec![
        Line::from(title),
        Line::from(vec![
            Span::styled(episode.level.clone(), Style::default().fg(palette.info)),
            Span::styled(
                format!("  ·  {}  ·  #{}", format_category_name(&episode.folder), episode.id),
                Style::default().fg(palette.muted),
            ),
        ]),
        Line::from(Span::styled(
            truncate(&episode.description, 160),
            Style::default().fg(palette.text),
        )),
        Line::from(vec![
            Span::styled("◀ previous [p]", nav_style(nav.has_previous())),
            Span::raw("    "),
            Span::styled("next [n] ▶", nav_style(nav.has_next())),
            Span::raw("    "),
            Span::styled("[ back", nav_style(nav.history().can_go_back())),
            Span::raw("  "),
            Span::styled("forward ]", nav_style(nav.history().can_go_forward())),
            Span::raw("    "),
            Span::styled("flashcards [v]", Style::default().fg(palette.muted)),
        ]),
    ];
    let header = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel_block("Episode", palette));
    frame.render_widget(header, area);
}

fn vocabulary_lines(title: &str, items: &[VocabularyItem], palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    ))];
    for item in items {
        let shown = display_word(item);
        let mut head = vec![Span::styled(
            shown.word.clone(),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        )];
        if let Some(pronunciation) = item.pronunciation.as_deref().filter(|p| !p.is_empty()) {
            head.push(Span::raw(" "));
            head.push(Span::styled(
                format!("/{pronunciation}/"),
                Style::default().fg(Color::White).bg(Color::Rgb(59, 130, 246)),
            ));
        }
        if let Some(category) = shown.category.as_deref() {
            let colors = category_badge(Some(category), palette.appearance);
            head.push(Span::raw(" "));
            head.push(Span::styled(
                format!(" {category} "),
                Style::default().fg(colors.fg).bg(colors.bg),
            ));
        }
        if let Some(subcategory) = shown.subcategory.as_deref() {
            let colors = subcategory_badge(Some(subcategory), palette.appearance);
            head.push(Span::raw(" "));
            head.push(Span::styled(
                format!(" {subcategory} "),
                Style::default().fg(colors.fg).bg(colors.bg),
            ));
        }
        lines.push(Line::from(head));
        lines.push(Line::from(Span::styled(
            format!("  {}", item.definition),
            Style::default().fg(palette.text),
        )));
        if let Some(example) = item.example.as_deref().filter(|e| !e.is_empty()) {
            lines.push(Line::from(Span::styled(
                format!("  Example: {example}"),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            )));
        }
    }
    lines.push(Line::default());
    lines
}

fn draw_transcript(frame: &mut Frame, area: Rect, root: &Root, episode: &Episode, palette: &Palette) {
    let view = root.transcript();
    if !view.visible {
        let hidden = Paragraph::new("Transcript hidden. Press t to show.")
            .style(Style::default().fg(palette.muted))
            .block(panel_block("Transcript", palette));
        frame.render_widget(hidden, area);
        return;
    }

    let transcript = &episode.transcript;
    let mut lines = vec![Line::from(Span::styled(
        "Dialogue",
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    ))];
    for line in &transcript.dialogue {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", line.speaker),
                Style::default().fg(palette.info).add_modifier(Modifier::BOLD),
            ),
            Span::styled(line.text.clone(), Style::default().fg(palette.text)),
        ]));
    }
    lines.push(Line::default());
    if !transcript.vocabulary.is_empty() {
        lines.extend(vocabulary_lines("Key Vocabulary", &transcript.vocabulary, palette));
    }
    if !transcript.supplementary().is_empty() {
        lines.extend(vocabulary_lines(
            "Supplementary Vocabulary",
            transcript.supplementary(),
            palette,
        ));
    }

    let body = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((view.scroll, 0))
        .block(panel_block("Transcript (t hide, PgUp/PgDn scroll)", palette));
    frame.render_widget(body, area);
}

fn draw_player(frame: &mut Frame, gauge_area: Rect, controls_area: Rect, root: &Root, palette: &Palette) {
    let playback = root.playback();
    let state = playback.state();

    if !playback.has_media() {
        let unavailable = Paragraph::new("Audio unavailable. Check PODLEARN_PLAYER_BIN and the log file.")
            .style(Style::default().fg(palette.muted))
            .block(panel_block("Player", palette));
        frame.render_widget(unavailable, gauge_area.union(controls_area));
        return;
    }

    let gauge = Gauge::default()
        .block(panel_block("Player", palette))
        .gauge_style(
            Style::default()
                .fg(palette.accent)
                .bg(palette.bg)
                .add_modifier(Modifier::BOLD),
        )
        .label(format!(
            "{} / {}",
            format_time(state.current_time),
            format_time(state.duration)
        ))
        .ratio(state.progress_ratio());
    frame.render_widget(gauge, gauge_area);

    let pill = |label: String, active: bool| {
        if active {
            Span::styled(label, pill_active(palette))
        } else {
            Span::styled(label, pill_inactive(palette))
        }
    };
    let controls = Paragraph::new(Line::from(vec![
        pill(
            if state.is_playing {
                " ⏸ PAUSE ".to_string()
            } else {
                " ▶ PLAY ".to_string()
            },
            state.is_playing,
        ),
        Span::raw(" "),
        pill(format!(" {}x ", state.playback_rate), false),
        Span::raw(" "),
        pill(" LOOP ".to_string(), state.is_looping),
        Span::raw(" "),
        Span::styled(
            " AUTO-NEXT ",
            if state.is_autoplay {
                Style::default()
                    .bg(palette.on)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                pill_inactive(palette)
            },
        ),
        Span::raw(" "),
        pill(format!(" VOL {:.0}% ", state.volume * 100.0), false),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Transport", palette));
    frame.render_widget(controls, controls_area);
}

fn category_line(root: &Root, palette: &Palette) -> Line<'static> {
    let mut spans = Vec::new();
    for category in root.categories() {
        let active = category == *root.category();
        let style = if active {
            pill_active(palette)
        } else {
            pill_inactive(palette)
        };
        spans.push(Span::styled(format!(" {} ", category.display_name()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn draw_episode_list(frame: &mut Frame, area: Rect, root: &Root, input: &InputMode, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(area);

    let categories = Paragraph::new(category_line(root, palette))
        .wrap(Wrap { trim: true })
        .block(panel_block("Categories (tab)", palette));
    frame.render_widget(categories, chunks[0]);

    let filtering = *input == InputMode::ListQuery;
    let filter_text = if filtering {
        format!("{}▏", root.list_query())
    } else if root.list_query().is_empty() {
        "press F to filter by title or number".to_string()
    } else {
        root.list_query().to_string()
    };
    let filter = Paragraph::new(Span::styled(
        filter_text,
        if filtering {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.muted)
        },
    ))
    .block(panel_block("Filter", palette));
    frame.render_widget(filter, chunks[1]);

    let displayed = root.displayed();
    let progress = root.progress();
    let selected = root.navigator().selected();
    let rows: Vec<Row> = displayed
        .iter()
        .map(|episode| {
            let mut markers = String::new();
            markers.push(if progress.is_completed(episode.id) { '✓' } else { ' ' });
            markers.push(if progress.is_favorite(episode.id) { '★' } else { ' ' });
            let style = if Some(episode.id) == selected {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text)
            };
            Row::new(vec![
                Cell::from(markers),
                Cell::from(format!("#{}", episode.id)),
                Cell::from(episode.title.clone()),
            ])
            .style(style)
        })
        .collect();

    let title = format!(
        "Episodes · {} ({})",
        root.category().display_name(),
        displayed.len()
    );
    let empty = displayed.is_empty();
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(10),
        ],
    )
    .block(panel_block(title, palette))
    .row_highlight_style(
        Style::default()
            .bg(palette.accent)
            .fg(palette.bg)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    let mut table_state = TableState::default().with_selected((!empty).then_some(root.list_cursor()));
    frame.render_stateful_widget(table, chunks[2], &mut table_state);

    if empty {
        let inner = chunks[2].inner(ratatui::layout::Margin::new(2, 1));
        let message = Paragraph::new("No episodes match.")
            .style(Style::default().fg(palette.muted));
        frame.render_widget(message, inner);
    }
}

pub(super) fn draw_status(frame: &mut Frame, area: Rect, root: &Root, palette: &Palette) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(root.status.clone(), status_style(&root.status, palette)),
        Span::raw("   "),
        Span::styled(
            format!("Visits: {}", root.analytics().visits_label()),
            Style::default().fg(palette.muted),
        ),
    ]))
    .block(panel_block("Status", palette));
    frame.render_widget(status, area);
}

const MANUAL: &str = "Getting started\n\
  Pick an episode from the list (↑/↓, Enter) or jump with n / p.\n\
  Levels run Elementary, Basic, Pre-Intermediate, Lower Intermediate,\n\
  Intermediate, Upper Intermediate, Advanced.\n\
\n\
Finding episodes\n\
  / searches titles, descriptions and levels.\n\
  Tab cycles categories (All Levels, Favorites, each level).\n\
  F filters the list by title or episode number.\n\
  [ and ] step back and forward through episodes you opened.\n\
\n\
Audio player\n\
  space play/pause, ←/→ jump 10 seconds, 0-9 seek to 0%-90%.\n\
  +/- volume, r speed (0.5x to 2x), l loop the episode.\n\
  a auto-next: when an episode ends it is marked completed and the next\n\
  one starts.\n\
\n\
Learning features\n\
  t shows or hides the transcript. Vocabulary badges are color coded\n\
  by word type. v opens flashcards: space flips, ←/→ change card.\n\
  f marks the episode as a favorite.\n\
\n\
Tips\n\
  Read the transcript first, then listen without it.\n\
  Repeat after the speakers to practice pronunciation.\n\
  Aim for one episode per day!\n\
\n\
Troubleshooting\n\
  No audio? Install mpv or point PODLEARN_PLAYER_BIN at a player.\n\
  Auto-next stopped? Check that AUTO-NEXT is highlighted.";

fn draw_modal(frame: &mut Frame, modal: &Modal, root: &Root, palette: &Palette) {
    match modal {
        Modal::Flashcards(deck) => draw_flashcards(frame, deck, palette),
        Modal::Manual => {
            let area = frame.area();
            let popup_area =
                centered_fixed_rect(80, area.height.saturating_sub(4).max(10), area);
            render_popup_shadow(frame, popup_area, palette);
            frame.render_widget(Clear, popup_area);
            let popup = Paragraph::new(format!("{MANUAL}\n\nPress any key to close."))
                .style(Style::default().fg(palette.text).bg(palette.bg))
                .wrap(Wrap { trim: false })
                .block(modal_block("User Manual", palette));
            frame.render_widget(popup, popup_area);
        }
        Modal::Support => {
            let support = root.support();
            let text = format!(
                "Enjoying the lessons? You can support the project here:\n\n{}\n\nImage: {}\n\nPress any key to close.",
                support.link,
                support.image_summary()
            );
            draw_text_popup(frame, "Buy me a coffee", &text, palette);
        }
        Modal::Notice { title, message } => {
            let text = format!("{message}\n\nPress any key to continue.");
            draw_text_popup(frame, title, &text, palette);
        }
    }
}

fn draw_flashcards(frame: &mut Frame, deck: &FlashcardDeck, palette: &Palette) {
    let card = deck.current();
    let shown = display_word(card);
    let mut lines = Vec::new();
    if deck.is_flipped() {
        lines.push(Line::from(Span::styled(
            "Definition",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
        lines.push(Line::from(card.definition.clone()));
        if let Some(example) = card.example.as_deref().filter(|e| !e.is_empty()) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("Example: {example}"),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
    } else {
        let category = shown.category.clone().unwrap_or_else(|| "Word".to_string());
        let colors = category_badge(shown.category.as_deref(), palette.appearance);
        lines.push(Line::from(Span::styled(
            format!(" {category} "),
            Style::default().fg(colors.fg).bg(colors.bg),
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            shown.word.clone(),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        )));
        if let Some(pronunciation) = card.pronunciation.as_deref().filter(|p| !p.is_empty()) {
            lines.push(Line::from(Span::styled(
                format!("/{pronunciation}/"),
                Style::default().fg(palette.muted),
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "space to flip",
            Style::default().fg(palette.muted),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "← prev   → next   Esc close",
        Style::default().fg(palette.muted),
    )));

    let popup_area = centered_fixed_rect(60, 16, frame.area());
    render_popup_shadow(frame, popup_area, palette);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(palette.text).bg(palette.bg))
        .wrap(Wrap { trim: true })
        .block(modal_block(deck.title(), palette));
    frame.render_widget(popup, popup_area);
}

pub(super) fn draw_text_popup(frame: &mut Frame, title: &str, text: &str, palette: &Palette) {
    let popup_area = popup_rect_for_text(frame.area(), text);
    render_popup_shadow(frame, popup_area, palette);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(palette.text).bg(palette.bg))
        .wrap(Wrap { trim: true })
        .block(modal_block(title.to_string(), palette));
    frame.render_widget(popup, popup_area);
}

pub(super) fn panel_block<'a>(title: impl Into<Line<'a>>, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.border))
        .title(title)
}

pub(super) fn modal_block<'a>(title: impl Into<Line<'a>>, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(palette.modal_border)
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

pub(super) fn pill_active(palette: &Palette) -> Style {
    Style::default()
        .bg(palette.accent)
        .fg(palette.bg)
        .add_modifier(Modifier::BOLD)
}

pub(super) fn pill_inactive(palette: &Palette) -> Style {
    Style::default().bg(palette.pill_bg).fg(palette.pill_fg)
}

fn status_style(status: &str, palette: &Palette) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(palette.error)
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(palette.info)
    } else {
        Style::default().fg(palette.text)
    }
}

pub(super) fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width.max(1));
    let clamped_height = height.min(area.height.max(1));
    let x = area.x + area.width.saturating_sub(clamped_width) / 2;
    let y = area.y + area.height.saturating_sub(clamped_height) / 2;
    Rect::new(x, y, clamped_width, clamped_height)
}

pub(super) fn render_popup_shadow(frame: &mut Frame, popup_area: Rect, palette: &Palette) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    let shadow_block = Block::default().style(Style::default().bg(palette.shadow));
    frame.render_widget(shadow_block, shadow);
}

pub(super) fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let max_line_width = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let min_width = 48.min(available_width);
    let max_width = 72.min(available_width);
    let desired_width = max_line_width.saturating_add(12);
    let width = desired_width.clamp(min_width, max_width);

    let available_height = area.height.saturating_sub(2).max(1);
    let min_height = 10.min(available_height);
    let max_height = 18.min(available_height);
    let desired_height = line_count.saturating_add(6);
    let height = desired_height.clamp(min_height, max_height);

    centered_fixed_rect(width, height, area)
}
