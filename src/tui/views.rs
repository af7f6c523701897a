use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::gitlab::types::{Job, MergeRequest};
use crate::query::QueryState;
use crate::status::{self, Tone};

use super::app::{App, Screen};
use super::state::{ExpansionState, SetupField};
use super::theme::Palette;

/// Maximum characters of a job name inside a chip.
const JOB_NAME_WIDTH: usize = 20;

const JOB_GRID_INDENT: &str = "      ";

/// One visible line of the dashboard tree.
///
/// Rows carry indices into the merge request list, not data; they are
/// rebuilt from the query result and expansion state on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    MergeRequest {
        mr_index: usize,
        expanded: bool,
    },
    /// Description / web URL line under an expanded merge request
    Detail {
        mr_index: usize,
    },
    Stage {
        mr_index: usize,
        stage_index: usize,
        expanded: bool,
    },
    /// Chip grid for an expanded stage's jobs
    JobGrid {
        mr_index: usize,
        stage_index: usize,
    },
}

/// Flatten the merge-request tree into visible rows.
///
/// Pure over its inputs so expansion behaviour can be tested without a
/// terminal.
pub fn build_rows(merge_requests: &[MergeRequest], expansion: &ExpansionState) -> Vec<Row> {
    let mut rows = Vec::new();

    for (mr_index, mr) in merge_requests.iter().enumerate() {
        let expanded = expansion.is_merge_request_expanded(&mr.id);
        rows.push(Row::MergeRequest { mr_index, expanded });

        if !expanded {
            continue;
        }

        if mr.description.is_some() || mr.web_url.is_some() {
            rows.push(Row::Detail { mr_index });
        }

        let Some(pipeline) = mr.latest_pipeline() else {
            continue;
        };

        for (stage_index, stage) in pipeline.stages.iter().enumerate() {
            let stage_expanded = expansion.is_stage_expanded(&mr.id, &stage.name);
            rows.push(Row::Stage {
                mr_index,
                stage_index,
                expanded: stage_expanded,
            });

            if stage_expanded && !stage.jobs.is_empty() {
                rows.push(Row::JobGrid {
                    mr_index,
                    stage_index,
                });
            }
        }
    }

    rows
}

pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::for_mode(app.theme());
    match app.screen {
        Screen::Setup => draw_setup(frame, app, &palette),
        Screen::Dashboard => draw_dashboard(frame, app, &palette),
    }
}

fn draw_setup(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(56, 12, frame.area());
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(2),
    ])
    .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "mrlens setup",
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    frame.render_widget(
        input_field(
            "Access token",
            &app.form.token,
            app.form.focus == SetupField::Token,
            palette,
        ),
        chunks[1],
    );
    frame.render_widget(
        input_field(
            "Project path",
            &app.form.project_path,
            app.form.focus == SetupField::ProjectPath,
            palette,
        ),
        chunks[2],
    );

    let save_style = if app.form.is_complete() {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.muted)
    };
    let save = Paragraph::new(Line::from(Span::styled("[ Save ]", save_style)))
        .alignment(Alignment::Center);
    frame.render_widget(save, chunks[3]);

    let hint = Paragraph::new(Line::from(Span::styled(
        "tab next field · enter save · esc cancel",
        Style::default().fg(palette.muted),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(hint, chunks[4]);
}

fn input_field<'a>(
    label: &'a str,
    value: &str,
    focused: bool,
    palette: &Palette,
) -> Paragraph<'a> {
    let border = if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };

    let mut text = value.to_string();
    if focused {
        text.push('▏');
    }

    Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(palette.text),
    )))
    .block(Block::bordered().title(label).border_style(border))
}

fn draw_dashboard(frame: &mut Frame, app: &App, palette: &Palette) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .split(frame.area());

    draw_header(frame, app, palette, chunks[0]);
    draw_body(frame, app, palette, chunks[1]);
    draw_footer(frame, app, palette, chunks[2]);
}

fn draw_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let project = app.query.project_path().unwrap_or_default().to_string();
    let left = Paragraph::new(Line::from(vec![
        Span::styled(
            " mrlens ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(project, Style::default().fg(palette.text)),
    ]));

    let right = Paragraph::new(Line::from(Span::styled(
        format!("theme: {} ", app.theme().label()),
        Style::default().fg(palette.muted),
    )))
    .alignment(Alignment::Right);

    frame.render_widget(left, area);
    frame.render_widget(right, area);
}

fn draw_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut spans = vec![Span::styled(
        " q quit · ↑/↓ move · enter expand · r refresh · t theme · s setup",
        Style::default().fg(palette.muted),
    )];
    if app.query.is_fetching() {
        spans.push(Span::styled(
            " · refreshing…",
            Style::default().fg(palette.active),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    match app.query.state() {
        QueryState::Idle | QueryState::Loading => {
            draw_placeholder(frame, palette, area, "Loading merge requests…", None);
        }
        QueryState::Error => {
            draw_placeholder(
                frame,
                palette,
                area,
                "An error occurred",
                Some("press r to retry"),
            );
        }
        QueryState::Ready { merge_requests, .. } if merge_requests.is_empty() => {
            draw_placeholder(frame, palette, area, "No open merge requests", None);
        }
        QueryState::Ready { merge_requests, .. } => {
            let rows = build_rows(merge_requests, &app.expansion);
            let items = list_items(merge_requests, &rows, palette, area.width);

            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(palette.selection_bg)
                    .add_modifier(Modifier::BOLD),
            );
            let mut state = ListState::default();
            state.select(Some(app.cursor.min(rows.len().saturating_sub(1))));
            frame.render_stateful_widget(list, area, &mut state);
        }
    }
}

fn draw_placeholder(
    frame: &mut Frame,
    palette: &Palette,
    area: Rect,
    message: &str,
    hint: Option<&str>,
) {
    let mut lines = vec![Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(palette.text),
    ))];
    if let Some(hint) = hint {
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(palette.muted),
        )));
    }

    let target = centered_rect(area.width.min(40), lines.len() as u16, area);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        target,
    );
}

fn list_items(
    merge_requests: &[MergeRequest],
    rows: &[Row],
    palette: &Palette,
    width: u16,
) -> Vec<ListItem<'static>> {
    rows.iter()
        .map(|row| match *row {
            Row::MergeRequest { mr_index, expanded } => {
                ListItem::new(merge_request_line(&merge_requests[mr_index], expanded, palette))
            }
            Row::Detail { mr_index } => {
                ListItem::new(detail_line(&merge_requests[mr_index], palette, width))
            }
            Row::Stage {
                mr_index,
                stage_index,
                expanded,
            } => match stage_at(merge_requests, mr_index, stage_index) {
                Some(stage) => ListItem::new(stage_line(
                    &stage.name,
                    stage.status.as_deref(),
                    stage.jobs.len(),
                    expanded,
                    palette,
                )),
                None => ListItem::new(Line::raw("")),
            },
            Row::JobGrid {
                mr_index,
                stage_index,
            } => match stage_at(merge_requests, mr_index, stage_index) {
                Some(stage) => ListItem::new(chip_lines(&stage.jobs, width, palette)),
                None => ListItem::new(Line::raw("")),
            },
        })
        .collect()
}

// A row index that misses the data it was built from renders empty.
fn stage_at(
    merge_requests: &[MergeRequest],
    mr_index: usize,
    stage_index: usize,
) -> Option<&crate::gitlab::types::Stage> {
    merge_requests
        .get(mr_index)
        .and_then(|mr| mr.latest_pipeline())
        .and_then(|pipeline| pipeline.stages.get(stage_index))
}

fn merge_request_line(mr: &MergeRequest, expanded: bool, palette: &Palette) -> Line<'static> {
    let marker = if expanded { "▾ " } else { "▸ " };
    let mut spans = vec![Span::styled(
        marker.to_string(),
        Style::default().fg(palette.muted),
    )];

    if let Some(pipeline) = mr.latest_pipeline() {
        let style = status::pipeline_style(pipeline.status);
        spans.push(Span::styled(
            format!("{} ", style.icon),
            Style::default().fg(palette.tone(style.tone)),
        ));
    }

    spans.push(Span::styled(
        mr.title.clone(),
        Style::default()
            .fg(palette.text)
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        format!("  {}", mr.reference()),
        Style::default().fg(palette.muted),
    ));

    if let Some(author) = &mr.author {
        spans.push(Span::styled(
            format!("  {}", author.name),
            Style::default().fg(palette.text),
        ));
    }

    if let Some(created_at) = mr.created_at {
        spans.push(Span::styled(
            format!(
                "  {}",
                created_at.with_timezone(&Local).format("%b %d, %Y %H:%M")
            ),
            Style::default().fg(palette.muted),
        ));
    }

    let (badge, tone) = rebase_badge(mr);
    spans.push(Span::styled(
        format!("  [{badge}]"),
        Style::default().fg(palette.tone(tone)),
    ));

    Line::from(spans)
}

fn rebase_badge(mr: &MergeRequest) -> (&'static str, Tone) {
    if mr.should_be_rebased {
        ("Needs Rebase", Tone::Attention)
    } else {
        ("Ready", Tone::Positive)
    }
}

fn detail_line(mr: &MergeRequest, palette: &Palette, width: u16) -> Line<'static> {
    let mut parts = Vec::new();
    if let Some(description) = &mr.description {
        if let Some(first) = description.lines().next() {
            parts.push(first.to_string());
        }
    }
    if let Some(web_url) = &mr.web_url {
        parts.push(web_url.clone());
    }

    let budget = (width as usize).saturating_sub(8).max(16);
    Line::from(Span::styled(
        format!("    ↪ {}", truncate(&parts.join(" · "), budget)),
        Style::default().fg(palette.muted),
    ))
}

fn stage_line(
    name: &str,
    stage_status: Option<&str>,
    job_count: usize,
    expanded: bool,
    palette: &Palette,
) -> Line<'static> {
    let marker = if expanded { "▾ " } else { "▸ " };
    let style = status::stage_style(stage_status);

    Line::from(vec![
        Span::styled(
            format!("    {marker}"),
            Style::default().fg(palette.muted),
        ),
        Span::styled(
            format!("{} ", style.icon),
            Style::default().fg(palette.tone(style.tone)),
        ),
        Span::styled(name.to_string(), Style::default().fg(palette.text)),
        Span::styled(
            if job_count == 1 {
                "  (1 job)".to_string()
            } else {
                format!("  ({job_count} jobs)")
            },
            Style::default().fg(palette.muted),
        ),
    ])
}

/// Render a stage's jobs as chips, wrapped to the available width.
fn chip_lines(jobs: &[Job], width: u16, palette: &Palette) -> Vec<Line<'static>> {
    let budget = (width as usize).max(JOB_GRID_INDENT.len() + JOB_NAME_WIDTH + 4);
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = vec![Span::raw(JOB_GRID_INDENT)];
    let mut used = JOB_GRID_INDENT.len();

    for job in jobs {
        let (text, tone) = job_chip(job);
        let chip_width = text.chars().count() + 1;

        if used + chip_width > budget && spans.len() > 1 {
            lines.push(Line::from(std::mem::take(&mut spans)));
            spans = vec![Span::raw(JOB_GRID_INDENT)];
            used = JOB_GRID_INDENT.len();
        }

        spans.push(Span::styled(text, Style::default().fg(palette.tone(tone))));
        spans.push(Span::raw(" "));
        used += chip_width;
    }

    if spans.len() > 1 {
        lines.push(Line::from(spans));
    }

    lines
}

fn job_chip(job: &Job) -> (String, Tone) {
    let style = status::job_style(job.status);
    (
        format!("[{} {}]", style.icon, truncate(&job.name, JOB_NAME_WIDTH)),
        style.tone,
    )
}

/// Character-count truncation with a trailing ellipsis.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
