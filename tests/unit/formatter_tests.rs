/*!
 * Tests for cue rendering against the subtitle grammars
 */

use regex::Regex;
use transcript_gateway::formatter::{OutputFormat, Rendered, format_timestamp, render};
use transcript_gateway::transcript::Cue;

/// Cues with millisecond-exact timings so parsing back is lossless
fn sample_cues() -> Vec<Cue> {
    vec![
        Cue::new("Welcome back", 0.0, 2.5),
        Cue::new("Line with, punctuation", 2.5, 1.25),
        Cue::new("Past the hour mark", 3725.125, 4.0),
    ]
}

fn text_of(rendered: Rendered) -> String {
    match rendered {
        Rendered::Text(text) => text,
        Rendered::Cues(_) => panic!("expected text output"),
    }
}

fn timestamp_to_ms(h: &str, m: &str, s: &str, ms: &str) -> u64 {
    h.parse::<u64>().unwrap() * 3_600_000
        + m.parse::<u64>().unwrap() * 60_000
        + s.parse::<u64>().unwrap() * 1_000
        + ms.parse::<u64>().unwrap()
}

/// Minimal SRT/VTT block reader: (index, start_ms, end_ms, text)
fn parse_blocks(text: &str, separator: char) -> Vec<(Option<usize>, u64, u64, String)> {
    let pattern = format!(
        r"(?m)(?:^(\d+)\n)?^(\d{{2}}):(\d{{2}}):(\d{{2}}){sep}(\d{{3}}) --> (\d{{2}}):(\d{{2}}):(\d{{2}}){sep}(\d{{3}})\n(.+)$",
        sep = regex::escape(&separator.to_string())
    );
    let re = Regex::new(&pattern).unwrap();
    re.captures_iter(text)
        .map(|c| {
            (
                c.get(1).map(|m| m.as_str().parse().unwrap()),
                timestamp_to_ms(&c[2], &c[3], &c[4], &c[5]),
                timestamp_to_ms(&c[6], &c[7], &c[8], &c[9]),
                c[10].to_string(),
            )
        })
        .collect()
}

#[test]
fn test_srt_output_should_parse_back_to_same_cues() {
    let cues = sample_cues();
    let text = text_of(render(&cues, OutputFormat::Srt));
    let blocks = parse_blocks(&text, ',');

    assert_eq!(blocks.len(), cues.len());
    for (i, (block, cue)) in blocks.iter().zip(&cues).enumerate() {
        assert_eq!(block.0, Some(i + 1));
        assert_eq!(block.1, cue.start_ms());
        assert_eq!(block.2, cue.end_ms());
        assert_eq!(block.3, cue.text);
    }
}

#[test]
fn test_srt_blocks_should_be_separated_by_blank_lines() {
    let text = text_of(render(&sample_cues(), OutputFormat::Srt));
    assert_eq!(text.matches("\n\n").count(), 2);
    assert!(text.ends_with("Past the hour mark\n"));
    assert!(text.contains("01:02:05,125 --> 01:02:09,125"));
}

#[test]
fn test_vtt_output_should_parse_back_to_same_cues() {
    let cues = sample_cues();
    let text = text_of(render(&cues, OutputFormat::Vtt));
    assert!(text.starts_with("WEBVTT\n\n"));

    let blocks = parse_blocks(&text, '.');
    assert_eq!(blocks.len(), cues.len());
    for (block, cue) in blocks.iter().zip(&cues) {
        assert_eq!(block.0, None);
        assert_eq!((block.1, block.2), (cue.start_ms(), cue.end_ms()));
        assert_eq!(block.3, cue.text);
    }
}

#[test]
fn test_txt_output_should_contain_only_texts() {
    let text = text_of(render(&sample_cues(), OutputFormat::Txt));
    assert_eq!(text, "Welcome back\nLine with, punctuation\nPast the hour mark");
    assert!(!text.contains("-->"));
}

#[test]
fn test_json_and_raw_should_keep_cue_structure() {
    let cues = sample_cues();
    for format in [OutputFormat::Json, OutputFormat::Raw] {
        match render(&cues, format) {
            Rendered::Cues(rendered) => assert_eq!(rendered, cues),
            Rendered::Text(_) => panic!("{} should be structural", format),
        }
    }

    let value = serde_json::to_value(render(&cues[..1], OutputFormat::Json)).unwrap();
    assert_eq!(value[0]["text"], "Welcome back");
    assert_eq!(value[0]["start"], 0.0);
    assert_eq!(value[0]["duration"], 2.5);
}

#[test]
fn test_every_format_should_render_empty_input() {
    for format in OutputFormat::ALL {
        let first = render(&[], format);
        assert_eq!(first, render(&[], format));
    }
    assert_eq!(text_of(render(&[], OutputFormat::Srt)), "");
    assert_eq!(text_of(render(&[], OutputFormat::Txt)), "");
}

#[test]
fn test_rendering_should_be_deterministic() {
    let cues = sample_cues();
    for format in OutputFormat::ALL {
        assert_eq!(render(&cues, format), render(&cues, format));
    }
}

#[test]
fn test_format_timestamp_should_roll_over_units() {
    assert_eq!(format_timestamp(0, ','), "00:00:00,000");
    assert_eq!(format_timestamp(59_999, '.'), "00:00:59.999");
    assert_eq!(format_timestamp(3_600_000, ','), "01:00:00,000");
}

#[test]
fn test_format_names_should_parse_back() {
    for format in OutputFormat::ALL {
        assert_eq!(format.name().parse::<OutputFormat>().unwrap(), format);
    }
    assert!("docx".parse::<OutputFormat>().is_err());
}
