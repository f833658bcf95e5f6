//! Meter text formatting.
//!
//! [`format_meter`] turns a [`FormatDict`] snapshot into the familiar
//! progress line:
//!
//! ```text
//! desc:  50% 5/10 [00:05<00:05,  1.00it/s]
//! ```
//!
//! A custom `bar_format` template selects the fragments to render. Fields are
//! written `{name}` or `{name:spec}` where `spec` accepts an optional
//! alignment (`<`, `>` or `^`, optionally preceded by a fill character), a
//! width, a `.precision` and a type among `f`, `d`, `s` and `%`. Unknown
//! fields are left untouched.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use stprogress::meter::{format_meter, FormatDict};
//!
//! let dict = FormatDict {
//!     n: 5,
//!     total: Some(10),
//!     elapsed: Duration::from_secs(5),
//!     ncols: Some(0),
//!     prefix: "desc".into(),
//!     ..FormatDict::default()
//! };
//! assert_eq!(format_meter(&dict), "desc:  50% 5/10 [00:05<00:05,  1.00it/s]");
//! ```

use std::time::Duration;

/// Characters used to draw literal bars, from empty to full.
const BAR_CHARSET: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
/// Bar width when the template asks for a bar but no width is known.
const DEFAULT_BAR_WIDTH: usize = 10;

/// Snapshot of the meter state used to render one line.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDict {
    /// Current position.
    pub n: u64,
    /// Expected number of iterations, if known.
    pub total: Option<u64>,
    /// Time since the meter started.
    pub elapsed: Duration,
    /// Width hint. `Some(0)` renders without a literal bar.
    pub ncols: Option<usize>,
    /// Description.
    pub prefix: String,
    /// Unit of one iteration.
    pub unit: String,
    /// Scale `n`, `total` and rates with SI prefixes.
    pub unit_scale: bool,
    /// Divisor used by `unit_scale`.
    pub unit_divisor: f64,
    /// Smoothed rate in units per second, if any was measured.
    pub rate: Option<f64>,
    /// Custom template.
    pub bar_format: Option<String>,
    /// Additional text appended after the rate.
    pub postfix: Option<String>,
    /// Position the meter started at.
    pub initial: u64,
}

impl Default for FormatDict {
    fn default() -> Self {
        Self {
            n: 0,
            total: None,
            elapsed: Duration::ZERO,
            ncols: None,
            prefix: String::new(),
            unit: "it".into(),
            unit_scale: false,
            unit_divisor: 1000.0,
            rate: None,
            bar_format: None,
            postfix: None,
            initial: 0,
        }
    }
}

/// Formats an interval as `MM:SS`, or `H:MM:SS` past one hour.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    let (mins, s) = (secs / 60, secs % 60);
    let (h, m) = (mins / 60, mins % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Formats a number with an SI prefix, keeping three significant figures.
pub fn format_sizeof(num: f64, suffix: &str, divisor: f64) -> String {
    let mut num = num;
    for unit in ["", "k", "M", "G", "T", "P", "E", "Z"] {
        if num.abs() < 999.5 {
            if num.abs() < 99.95 {
                if num.abs() < 9.995 {
                    return format!("{num:1.2}{unit}{suffix}");
                }
                return format!("{num:2.1}{unit}{suffix}");
            }
            return format!("{num:3.0}{unit}{suffix}");
        }
        num /= divisor;
    }
    format!("{num:3.1}Y{suffix}")
}

/// Renders the meter line described by `dict`.
pub fn format_meter(dict: &FormatDict) -> String {
    // Once the position overshoots, the total is no longer meaningful.
    let total = dict.total.filter(|&t| t > 0 && dict.n <= t);
    let elapsed_s = dict.elapsed.as_secs_f64();

    let rate = dict.rate.or_else(|| {
        (elapsed_s > 0.0).then(|| dict.n.saturating_sub(dict.initial) as f64 / elapsed_s)
    });
    let rate = rate.filter(|r| *r > 0.0);
    let inv_rate = rate.map(|r| 1.0 / r);

    let scaled = |value: f64| {
        if dict.unit_scale {
            format_sizeof(value, "", dict.unit_divisor)
        } else {
            format!("{value:5.2}")
        }
    };
    let unit = dict.unit.as_str();
    let rate_noinv_fmt = match rate {
        Some(r) => format!("{}{unit}/s", scaled(r)),
        None => format!("?{unit}/s"),
    };
    let rate_inv_fmt = match inv_rate {
        Some(r) => format!("{}s/{unit}", scaled(r)),
        None => format!("?s/{unit}"),
    };
    let rate_fmt = match inv_rate {
        Some(r) if r > 1.0 => rate_inv_fmt.clone(),
        _ => rate_noinv_fmt.clone(),
    };

    let count = |value: u64| {
        if dict.unit_scale {
            format_sizeof(value as f64, "", dict.unit_divisor)
        } else {
            value.to_string()
        }
    };
    let n_fmt = count(dict.n);
    let total_fmt = total.map(count).unwrap_or_else(|| "?".into());

    let postfix = dict
        .postfix
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| format!(", {p}"))
        .unwrap_or_default();

    let remaining = match (rate, total) {
        (Some(r), Some(t)) => Duration::try_from_secs_f64((t - dict.n) as f64 / r).ok(),
        _ => None,
    };
    let elapsed_str = format_interval(dict.elapsed);
    let remaining_str = remaining
        .map(format_interval)
        .unwrap_or_else(|| "?".into());

    let mut l_bar = if dict.prefix.is_empty() {
        String::new()
    } else if dict.prefix.ends_with(": ") {
        dict.prefix.clone()
    } else {
        format!("{}: ", dict.prefix)
    };

    let mut fields = Fields {
        values: vec![
            ("n", Field::Int(dict.n)),
            ("n_fmt", Field::Str(n_fmt.clone())),
            ("total", total.map_or(Field::Str(String::new()), Field::Int)),
            ("total_fmt", Field::Str(total_fmt.clone())),
            ("elapsed", Field::Str(elapsed_str.clone())),
            ("elapsed_s", Field::Float(elapsed_s)),
            ("ncols", dict.ncols.map_or(Field::Str(String::new()), |c| Field::Int(c as u64))),
            ("desc", Field::Str(dict.prefix.clone())),
            ("unit", Field::Str(dict.unit.clone())),
            ("rate", rate.map_or(Field::Str("?".into()), Field::Float)),
            ("rate_fmt", Field::Str(rate_fmt.clone())),
            ("rate_noinv", rate.map_or(Field::Str("?".into()), Field::Float)),
            ("rate_noinv_fmt", Field::Str(rate_noinv_fmt)),
            ("rate_inv", inv_rate.map_or(Field::Str("?".into()), Field::Float)),
            ("rate_inv_fmt", Field::Str(rate_inv_fmt)),
            ("postfix", Field::Str(postfix.clone())),
            ("unit_divisor", Field::Float(dict.unit_divisor)),
            ("remaining", Field::Str(remaining_str.clone())),
            (
                "remaining_s",
                remaining.map_or(Field::Str("?".into()), |r| Field::Float(r.as_secs_f64())),
            ),
        ],
    };

    let bar_format = dict.bar_format.as_deref().filter(|f| !f.is_empty());
    let Some(total) = total else {
        return match bar_format {
            Some(template) => {
                fields.push("l_bar", Field::Str(l_bar));
                fields.push("r_bar", Field::Str(String::new()));
                fields.push("percentage", Field::Int(0));
                render_with_bar(template, &dict.prefix, &fields, 0.0, dict.ncols)
            }
            None => format!("{l_bar}{n_fmt}{unit} [{elapsed_str}, {rate_fmt}{postfix}]"),
        };
    };

    let frac = dict.n as f64 / total as f64;
    let percentage = frac * 100.0;
    l_bar.push_str(&format!("{percentage:3.0}%|"));
    let r_bar = format!("| {n_fmt}/{total_fmt} [{elapsed_str}<{remaining_str}, {rate_fmt}{postfix}]");

    if dict.ncols == Some(0) {
        return format!("{}{}", &l_bar[..l_bar.len() - 1], &r_bar[1..]);
    }

    fields.push("l_bar", Field::Str(l_bar));
    fields.push("r_bar", Field::Str(r_bar));
    fields.push("percentage", Field::Float(percentage));
    let template = bar_format.unwrap_or("{l_bar}{bar}{r_bar}");
    render_with_bar(template, &dict.prefix, &fields, frac, dict.ncols)
}

/// Renders `template` once without the bar to measure the remaining width,
/// then a second time with a bar filling it.
fn render_with_bar(
    template: &str,
    prefix: &str,
    fields: &Fields,
    frac: f64,
    ncols: Option<usize>,
) -> String {
    let template = if prefix.is_empty() {
        template.replace("{desc}: ", "")
    } else {
        template.to_string()
    };

    let (nobar, has_bar) = render_template(&template, fields, |_| String::new());
    if !has_bar {
        return nobar;
    }

    let free = ncols
        .map(|c| c.saturating_sub(nobar.chars().count()).max(1))
        .unwrap_or(DEFAULT_BAR_WIDTH);
    render_template(&template, fields, |width| draw_bar(frac, width.unwrap_or(free))).0
}

/// Draws a bar of `width` cells filled to `frac`.
fn draw_bar(frac: f64, width: usize) -> String {
    let steps = BAR_CHARSET.len() - 1;
    let filled = (frac.clamp(0.0, 1.0) * (width * steps) as f64) as usize;
    let (full, partial) = (filled / steps, filled % steps);

    let mut bar: String = std::iter::repeat(BAR_CHARSET[steps]).take(full).collect();
    if full < width {
        bar.push(BAR_CHARSET[partial]);
        bar.extend(std::iter::repeat(BAR_CHARSET[0]).take(width - full - 1));
    }
    bar
}

#[derive(Debug, Clone)]
enum Field {
    Str(String),
    Int(u64),
    Float(f64),
}

struct Fields {
    values: Vec<(&'static str, Field)>,
}

impl Fields {
    fn push(&mut self, name: &'static str, value: Field) {
        self.values.push((name, value));
    }

    fn get(&self, name: &str) -> Option<&Field> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Substitutes `{field[:spec]}` occurrences. `bar` renders through
/// `draw`, which receives the explicit width of the placeholder if any.
/// Returns the text and whether a bar placeholder was met.
fn render_template(
    template: &str,
    fields: &Fields,
    draw: impl Fn(Option<usize>) -> String,
) -> (String, bool) {
    let mut out = String::with_capacity(template.len());
    let mut has_bar = false;
    let mut rest = template;

    while let Some(start) = rest.find(['{', '}']) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return (out, has_bar);
        };
        let placeholder = &tail[1..end];
        let (name, spec) = match placeholder.split_once(':') {
            Some((name, spec)) => (name, spec),
            None => (placeholder, ""),
        };
        // Conversions such as `!r` have no meaning here.
        let name = name.split('!').next().unwrap_or(name);

        if name == "bar" {
            has_bar = true;
            out.push_str(&draw(parse_bar_width(spec)));
        } else if let Some(value) = fields.get(name) {
            out.push_str(&apply_spec(value, spec));
        } else {
            out.push_str(&tail[..=end]);
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    (out, has_bar)
}

/// Extracts the width from a bar spec such as `10` or `10u`.
fn parse_bar_width(spec: &str) -> Option<usize> {
    let digits: String = spec
        .trim_start_matches('-')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|w| *w > 0)
}

#[derive(Debug, Default, PartialEq)]
struct Spec {
    fill: Option<char>,
    align: Option<char>,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

fn parse_spec(spec: &str) -> Spec {
    let mut out = Spec::default();
    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;

    let is_align = |c: char| matches!(c, '<' | '>' | '^');
    if chars.len() >= 2 && is_align(chars[1]) {
        out.fill = Some(chars[0]);
        out.align = Some(chars[1]);
        i = 2;
    } else if chars.first().copied().is_some_and(is_align) {
        out.align = Some(chars[0]);
        i = 1;
    }

    let start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    out.width = chars[start..i].iter().collect::<String>().parse().unwrap_or(0);

    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        out.precision = chars[start..i].iter().collect::<String>().parse().ok();
    }

    out.kind = chars.get(i).copied();
    out
}

fn apply_spec(value: &Field, spec: &str) -> String {
    let spec = parse_spec(spec);

    let (text, numeric) = match value {
        Field::Str(s) => {
            let s = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.clone(),
            };
            (s, false)
        }
        Field::Int(v) => match (spec.kind, spec.precision) {
            (Some('f'), p) => (format!("{:.*}", p.unwrap_or(6), *v as f64), true),
            (Some('%'), p) => (format!("{:.*}%", p.unwrap_or(6), *v as f64 * 100.0), true),
            _ => (v.to_string(), true),
        },
        Field::Float(v) => match (spec.kind, spec.precision) {
            (Some('%'), p) => (format!("{:.*}%", p.unwrap_or(6), v * 100.0), true),
            (Some('d'), _) => (format!("{:.0}", v.trunc()), true),
            (Some('f'), p) => (format!("{:.*}", p.unwrap_or(6), v), true),
            (_, Some(p)) => (format!("{v:.p$}"), true),
            (_, None) if v.fract() == 0.0 && v.is_finite() => (format!("{v:.1}"), true),
            (_, None) => (v.to_string(), true),
        },
    };

    let len = text.chars().count();
    if len >= spec.width {
        return text;
    }
    let pad = spec.width - len;
    let fill = spec.fill.unwrap_or(' ').to_string();
    let align = spec.align.unwrap_or(if numeric { '>' } else { '<' });
    match align {
        '>' => format!("{}{text}", fill.repeat(pad)),
        '^' => format!("{}{text}{}", fill.repeat(pad / 2), fill.repeat(pad - pad / 2)),
        _ => format!("{text}{}", fill.repeat(pad)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(n: u64, total: Option<u64>, elapsed: u64) -> FormatDict {
        FormatDict {
            n,
            total,
            elapsed: Duration::from_secs(elapsed),
            ncols: Some(0),
            ..FormatDict::default()
        }
    }

    #[test]
    fn intervals() {
        assert_eq!(format_interval(Duration::from_secs(0)), "00:00");
        assert_eq!(format_interval(Duration::from_secs(65)), "01:05");
        assert_eq!(format_interval(Duration::from_secs(3_725)), "1:02:05");
    }

    #[test]
    fn sizeof() {
        assert_eq!(format_sizeof(5.0, "", 1000.0), "5.00");
        assert_eq!(format_sizeof(42.0, "", 1000.0), "42.0");
        assert_eq!(format_sizeof(420.0, "", 1000.0), "420");
        assert_eq!(format_sizeof(1_500.0, "B", 1000.0), "1.50kB");
        assert_eq!(format_sizeof(2_048.0, "", 1024.0), "2.00k");
    }

    #[test]
    fn start_of_known_total() {
        assert_eq!(format_meter(&dict(0, Some(50), 0)), "  0% 0/50 [00:00<?, ?it/s]");
    }

    #[test]
    fn slow_rates_are_inverted() {
        assert_eq!(
            format_meter(&dict(10, Some(50), 50)),
            " 20% 10/50 [00:50<03:20,  5.00s/it]"
        );
    }

    #[test]
    fn unknown_total() {
        assert_eq!(format_meter(&dict(4, None, 2)), "4it [00:02,  2.00it/s]");
        let mut d = dict(4, None, 2);
        d.prefix = "work".into();
        assert_eq!(format_meter(&d), "work: 4it [00:02,  2.00it/s]");
    }

    #[test]
    fn unrepresentable_remaining_time_is_unknown() {
        assert_eq!(
            format_meter(&dict(1, Some(u64::MAX), 2)),
            format!("  0% 1/{} [00:02<?,  2.00s/it]", u64::MAX)
        );
    }

    #[test]
    fn zero_total_is_unknown() {
        assert_eq!(format_meter(&dict(0, Some(0), 0)), "0it [00:00, ?it/s]");
    }

    #[test]
    fn postfix_is_appended() {
        let mut d = dict(1, Some(2), 1);
        d.postfix = Some("loss=0.1".into());
        assert_eq!(format_meter(&d), " 50% 1/2 [00:01<00:01,  1.00it/s, loss=0.1]");
    }

    #[test]
    fn custom_template_fields() {
        let mut d = dict(1, Some(4), 1);
        d.prefix = "job".into();
        d.bar_format = Some("{desc} {percentage:.0f}% {n_fmt}/{total_fmt}".into());
        d.ncols = None;
        assert_eq!(format_meter(&d), "job 25% 1/4");
    }

    #[test]
    fn template_without_description_drops_separator() {
        let mut d = dict(1, Some(4), 1);
        d.bar_format = Some("{desc}: {n}".into());
        d.ncols = None;
        assert_eq!(format_meter(&d), "1");
    }

    #[test]
    fn unknown_fields_are_verbatim() {
        let mut d = dict(1, Some(4), 1);
        d.bar_format = Some("{nope} {{x}}".into());
        d.ncols = None;
        assert_eq!(format_meter(&d), "{nope} {x}");
    }

    #[test]
    fn literal_bar_fills_width() {
        let mut d = dict(5, Some(10), 5);
        d.bar_format = Some("|{bar}|".into());
        d.ncols = Some(12);
        assert_eq!(format_meter(&d), "|█████     |");
    }

    #[test]
    fn literal_bar_explicit_width() {
        assert_eq!(draw_bar(1.0, 4), "████");
        assert_eq!(draw_bar(0.0, 3), "   ");
        assert_eq!(draw_bar(0.5, 3), "█▌ ");
    }

    #[test]
    fn spec_alignment() {
        assert_eq!(apply_spec(&Field::Str("ab".into()), ">4"), "  ab");
        assert_eq!(apply_spec(&Field::Str("ab".into()), "*^6"), "**ab**");
        assert_eq!(apply_spec(&Field::Int(7), "3"), "  7");
        assert_eq!(apply_spec(&Field::Float(0.25), ".0%"), "25%");
    }
}
