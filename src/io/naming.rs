//! Output file naming.

use crate::float_types::Real;

/// Expands a filename pattern.
///
/// | key     | value                                  |
/// |---------|----------------------------------------|
/// | `%{b}`  | `basename`                             |
/// | `%{l}`  | layer number, zero padded to 2 digits  |
/// | `%{n}`  | same as `%{l}`                         |
/// | `%{e}`  | elevation rounded to whole metres      |
///
/// `%%{` produces a literal `%{`. Unknown keys are kept verbatim.
pub fn substitute_filename_pattern(pattern: &str, basename: &str, layer: usize, elevation: Real) -> String {
    let mut out = String::with_capacity(pattern.len() + basename.len());
    let mut rest = pattern;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(after) = rest.strip_prefix("%%{") {
            out.push_str("%{");
            rest = after;
            continue;
        }

        let expanded = rest.strip_prefix("%{").and_then(|body| {
            let close = body.find('}')?;
            let key = &body[..close];
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            let value = match key {
                "b" => basename.to_string(),
                "l" | "n" => format!("{layer:02}"),
                "e" => format!("{}", elevation.round() as i64),
                _ => format!("%{{{key}}}"),
            };
            Some((value, &body[close + 1..]))
        });

        match expanded {
            Some((value, after)) => {
                out.push_str(&value);
                rest = after;
            },
            None => {
                out.push('%');
                rest = &rest[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

/// Stem for one layer's SVG sheet: `<base>_layer_NN_elev_Em`.
pub fn layer_file_stem(basename: &str, layer: usize, elevation: Real) -> String {
    format!("{basename}_layer_{layer:02}_elev_{}m", elevation.round() as i64)
}
