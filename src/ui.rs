use crate::charts::{GroupedBarChart, Histogram, ScatterChart};
use crate::config::Theme;
use crate::dashboard::{DashboardCore, Page};
use crate::pipeline::Analysis;
use ratatui::prelude::*;
use ratatui::widgets::canvas::Canvas;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap};
use time::OffsetDateTime;
use time::macros::format_description;

const APP_TITLE_WITH_VERSION: &str = "streamdash v0.1.0  ";

#[derive(Clone, Copy)]
struct ThemePalette {
    bg: Color,
    panel_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    /// Bar colours, most recent year first.
    series: [Color; 3],
}

fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Dark => ThemePalette {
            bg: Color::Rgb(10, 15, 24),
            panel_bg: Color::Rgb(19, 29, 43),
            border: Color::Rgb(69, 121, 176),
            text: Color::Rgb(214, 228, 248),
            muted: Color::Rgb(149, 173, 204),
            accent: Color::Rgb(0, 150, 255),
            alert: Color::Rgb(249, 174, 88),
            series: [
                Color::Rgb(17, 103, 177),
                Color::Rgb(42, 157, 244),
                Color::Rgb(160, 200, 255),
            ],
        },
        Theme::Light => ThemePalette {
            bg: Color::Rgb(244, 246, 250),
            panel_bg: Color::Rgb(255, 255, 255),
            border: Color::Rgb(120, 144, 176),
            text: Color::Rgb(24, 32, 48),
            muted: Color::Rgb(96, 110, 132),
            accent: Color::Rgb(0, 110, 200),
            alert: Color::Rgb(196, 96, 20),
            series: [
                Color::Rgb(17, 103, 177),
                Color::Rgb(42, 157, 244),
                Color::Rgb(120, 170, 235),
            ],
        },
    }
}

pub fn draw(frame: &mut Frame, core: &DashboardCore, command_buffer: &str, command_mode: bool) {
    let colors = palette(core.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, core, &colors, vertical[0]);

    match &core.analysis {
        None => draw_empty(frame, core, &colors, vertical[1]),
        Some(analysis) if analysis.is_empty() => draw_empty(frame, core, &colors, vertical[1]),
        Some(analysis) => draw_page(frame, core, analysis, &colors, vertical[1]),
    }

    let footer = if command_mode {
        Paragraph::new(Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(command_buffer, Style::default().fg(colors.text)),
        ]))
    } else {
        Paragraph::new(Line::from(vec![
            Span::styled(
                "Keys: Tab/arrows pages, Up/Down artist, +/- top N, r rerun, e example, : command, q quit",
                Style::default().fg(colors.muted),
            ),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
        ]))
    };
    frame.render_widget(
        footer.block(panel_block(
            "Message",
            colors.panel_bg,
            colors.text,
            colors.border,
        )),
        vertical[2],
    );
}

fn draw_header(frame: &mut Frame, core: &DashboardCore, colors: &ThemePalette, area: Rect) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let left = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(core.input_summary(), Style::default().fg(colors.text)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!("Top {}", core.top_artists.get()),
            Style::default().fg(colors.alert),
        ),
    ]));
    frame.render_widget(left, chunks[0]);

    let mut spans = Vec::new();
    for (idx, page) in Page::ALL.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" -- ", Style::default().fg(colors.muted)));
        }
        let mut style = Style::default().fg(colors.text);
        if page == core.page {
            style = style
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        spans.push(Span::styled(page.label(), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_empty(frame: &mut Frame, core: &DashboardCore, colors: &ThemePalette, area: Rect) {
    let message = if core.analysis.is_some() {
        "The loaded history has no play records."
    } else {
        "No analysis yet."
    };
    let body = Paragraph::new(vec![
        Line::from(Span::styled(message, Style::default().fg(colors.text))),
        Line::from(""),
        Line::from(Span::styled(
            ":load <file or folder>   analyze streaming history JSON",
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!("e                       load {}", core.example_path.display()),
            Style::default().fg(colors.muted),
        )),
    ])
    .block(panel_block(
        "Dashboard",
        colors.panel_bg,
        colors.text,
        colors.border,
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(body, area);
}

fn draw_page(
    frame: &mut Frame,
    core: &DashboardCore,
    analysis: &Analysis,
    colors: &ThemePalette,
    area: Rect,
) {
    let charts = &analysis.dashboard;
    match core.page {
        Page::Scatter => draw_scatter(frame, &charts.scatter, colors, area),
        Page::YearBars => draw_year_bars(frame, &charts.year_bars, colors, area),
        Page::Timeline => draw_histogram(frame, &charts.timeline, colors.series[0], colors, area),
        Page::Artists => match core.selected_artist_chart() {
            Some(chart) => {
                let title = format!(
                    "{}  [{}/{}]",
                    chart.histogram.title,
                    chart.rank,
                    charts.artists.len()
                );
                let histogram = Histogram {
                    title,
                    bins: chart.histogram.bins.clone(),
                };
                draw_histogram(frame, &histogram, colors.series[1], colors, area);
            }
            None => {
                let body = Paragraph::new(Span::styled(
                    format!(
                        "No artist played in {}.",
                        analysis.years.windows.most_recent().label
                    ),
                    Style::default().fg(colors.muted),
                ))
                .block(panel_block(
                    "Artists",
                    colors.panel_bg,
                    colors.text,
                    colors.border,
                ));
                frame.render_widget(body, area);
            }
        },
    }
}

fn draw_scatter(frame: &mut Frame, chart: &ScatterChart, colors: &ThemePalette, area: Rect) {
    let (x_bounds, y_bounds) = scatter_bounds(chart);
    let label_style = Style::default()
        .fg(colors.accent)
        .add_modifier(Modifier::BOLD);
    let axis_style = Style::default().fg(colors.muted);

    let canvas = Canvas::default()
        .block(panel_block(
            &chart.title,
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .background_color(colors.panel_bg)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for point in &chart.points {
                ctx.print(
                    point.tracks as f64,
                    point.hrs_played,
                    Span::styled(point.label.clone(), label_style),
                );
            }
            ctx.print(
                x_bounds[0],
                y_bounds[0],
                Span::styled(
                    format!("{:.0} tracks", x_bounds[0]),
                    axis_style,
                ),
            );
            ctx.print(
                x_bounds[0],
                y_bounds[1],
                Span::styled(format!("{:.1} hours", y_bounds[1]), axis_style),
            );
        });
    frame.render_widget(canvas, area);
}

/// Axis ranges padded so edge labels stay readable.
fn scatter_bounds(chart: &ScatterChart) -> ([f64; 2], [f64; 2]) {
    let xs = chart.points.iter().map(|point| point.tracks as f64);
    let ys = chart.points.iter().map(|point| point.hrs_played);
    let (x_min, x_max) = min_max(xs);
    let (y_min, y_max) = min_max(ys);
    let x_pad = ((x_max - x_min) * 0.15).max(1.0);
    let y_pad = ((y_max - y_min) * 0.1).max(0.1);
    (
        [(x_min - x_pad).max(0.0), x_max + x_pad],
        [(y_min - y_pad).max(0.0), y_max + y_pad],
    )
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (low, high) = values.fold((f64::MAX, f64::MIN), |(low, high), value| {
        (low.min(value), high.max(value))
    });
    if low > high { (0.0, 1.0) } else { (low, high) }
}

fn draw_year_bars(frame: &mut Frame, chart: &GroupedBarChart, colors: &ThemePalette, area: Rect) {
    let outer = panel_block(&chart.title, colors.panel_bg, colors.text, colors.border);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(inner);

    let mut legend = Vec::new();
    for (index, label) in chart.series.iter().enumerate() {
        legend.push(Span::styled(
            "■ ",
            Style::default().fg(colors.series[index % colors.series.len()]),
        ));
        legend.push(Span::styled(
            format!("{label}   "),
            Style::default().fg(colors.text),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(legend)), rows[0]);

    let mut bar_chart = BarChart::default()
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2)
        .value_style(Style::default().fg(colors.bg))
        .label_style(Style::default().fg(colors.muted));
    for group in &chart.groups {
        let bars: Vec<Bar> = group
            .bars
            .iter()
            .map(|bar| {
                Bar::default()
                    .value(hundredths(bar.hrs_played))
                    .text_value(bar_value_label(bar.hrs_played))
                    .style(Style::default().fg(colors.series[bar.series % colors.series.len()]))
            })
            .collect();
        bar_chart = bar_chart.data(
            BarGroup::default()
                .label(Line::from(short_label(&group.artist, 8)))
                .bars(&bars),
        );
    }
    frame.render_widget(bar_chart, rows[1]);
}

fn draw_histogram(
    frame: &mut Frame,
    histogram: &Histogram,
    bar_color: Color,
    colors: &ThemePalette,
    area: Rect,
) {
    let outer = panel_block(&histogram.title, colors.panel_bg, colors.text, colors.border);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let slots = histogram.bins.len().max(1) as u16;
    let bar_width = (rows[0].width / slots).saturating_sub(1).max(1);
    let bars: Vec<Bar> = histogram
        .bins
        .iter()
        .map(|bin| {
            Bar::default()
                .value(bin.count)
                .text_value(String::new())
                .style(Style::default().fg(bar_color))
        })
        .collect();
    let chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, rows[0]);

    let axis = match histogram.span() {
        Some((start, end)) => format!(
            "{}  ..  {}   peak {} tracks per bin, {} total",
            month_label(start),
            month_label(end),
            histogram.max_count(),
            histogram.total()
        ),
        None => String::from("no timestamps"),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(axis, Style::default().fg(colors.muted))),
        rows[1],
    );
}

fn month_label(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[year]-[month]"))
        .unwrap_or_else(|_| ts.date().to_string())
}

/// One decimal so a short year still reads as a played year.
fn bar_value_label(hours: f64) -> String {
    format!("{hours:.1}")
}

fn hundredths(hours: f64) -> u64 {
    (hours * 100.0).round().max(0.0) as u64
}

fn short_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut out: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}
