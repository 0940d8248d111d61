use tracing::debug;

use crate::models::{TagConfig, TranscriptRecord, TAG_FIELD_WIDTH, TAG_WIDTH, leading_tag, skip_chars};

/// Scenario assigned to lines that precede any scenario marker
pub const DEFAULT_SCENARIO: &str = "N/A";

/// Result of Stage 0 parsing for one file
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Collapsed line-groups in file order
    pub records: Vec<TranscriptRecord>,
    /// Number of physical lines scanned
    pub lines_read: usize,
    /// Groups dropped as metadata (begin, scenario and encoding markers)
    pub groups_discarded: usize,
}

/// Lines sharing one `(group_id, scenario)` key
#[derive(Debug)]
struct LineGroup {
    group_id: u64,
    scenario: String,
    opened_by_marker: bool,
    lines: Vec<String>,
}

/// Forward-scan accumulator threaded through the fold over a file's lines
#[derive(Debug)]
struct ScanState {
    current_scenario: String,
    current_tag: Option<String>,
    group_id: u64,
    groups: Vec<LineGroup>,
    lines_read: usize,
}

impl ScanState {
    fn new() -> Self {
        Self {
            current_scenario: DEFAULT_SCENARIO.to_string(),
            current_tag: None,
            group_id: 0,
            groups: Vec::new(),
            lines_read: 0,
        }
    }

    fn advance(mut self, line: &str, tags: &TagConfig) -> Self {
        let line = line.trim_end_matches(['\n', '\r']);
        let text = line.replace('\t', " ");
        self.lines_read += 1;

        let is_marker = line.starts_with(tags.scenario_prefix.as_str());
        if is_marker {
            self.current_scenario = skip_chars(&text, tags.scenario_prefix.chars().count())
                .trim()
                .to_string();
            // a marker ends the current tag run
            self.current_tag = None;
        }

        if let Some(tag) = leading_tag(line).filter(|tag| tags.is_recognized(tag)) {
            if self.current_tag.as_deref() != Some(tag) {
                self.current_tag = Some(tag.to_string());
                self.group_id += 1;
            }
        }

        match self.groups.last_mut() {
            Some(group)
                if !is_marker
                    && group.group_id == self.group_id
                    && group.scenario == self.current_scenario =>
            {
                group.lines.push(text);
            }
            _ => self.groups.push(LineGroup {
                group_id: self.group_id,
                scenario: self.current_scenario.clone(),
                opened_by_marker: is_marker,
                lines: vec![text],
            }),
        }

        self
    }

    fn finish(self, source_file: &str, tags: &TagConfig) -> ParseResult {
        let mut records = Vec::with_capacity(self.groups.len());
        let mut groups_discarded = 0;
        let mut utterance_count = 0u64;

        for group in self.groups {
            let joined = group.lines.join(" ");
            let line_information: String = joined.chars().take(TAG_WIDTH).collect();

            if group.opened_by_marker || tags.is_discarded(&line_information) {
                groups_discarded += 1;
                continue;
            }

            if tags.is_speaker(&line_information) {
                utterance_count += 1;
            }

            records.push(TranscriptRecord {
                line_group_id: group.group_id,
                scenario: group.scenario,
                text: skip_chars(&joined, TAG_FIELD_WIDTH).to_string(),
                line_information,
                utterance_count,
                source_file: source_file.to_string(),
            });
        }

        ParseResult {
            records,
            lines_read: self.lines_read,
            groups_discarded,
        }
    }
}

/// Perform Stage 0: turn one file's raw lines into transcript records
///
/// Lines are grouped by contiguous runs of a recognized tag. Lines with an
/// unrecognized or missing tag (continuations, `@End`, malformed short lines)
/// join whatever group is open. A scenario marker switches the scenario for
/// all following groups and closes the current tag run; the marker line and
/// any untagged lines directly after it form a group that is discarded.
pub fn parse_transcript<'a, I>(lines: I, source_file: &str, tags: &TagConfig) -> ParseResult
where
    I: IntoIterator<Item = &'a str>,
{
    let state = lines
        .into_iter()
        .fold(ScanState::new(), |state, line| state.advance(line, tags));
    let result = state.finish(source_file, tags);

    debug!(
        "Parsed {}: {} lines into {} records ({} metadata groups dropped)",
        source_file,
        result.lines_read,
        result.records.len(),
        result.groups_discarded
    );

    result
}

/// Parse the full text of one transcript file
pub fn parse_transcript_str(content: &str, source_file: &str, tags: &TagConfig) -> ParseResult {
    parse_transcript(content.lines(), source_file, tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "@UTF8\n\
@Begin\n\
@Languages:\teng\n\
@Participants:\tPAR Participant, INV Investigator\n\
@G:\tSpeech\n\
*INV:\thow is your speech these days ?\n\
*PAR:\t&-um it's pretty good .\n\
%mor:\tpro|it aux|be&3S adv|pretty adj|good .\n\
%gra:\t1|2|SUBJ 2|0|ROOT\n\
*PAR:\tbetter than before .\n\
\tmuch better .\n\
@G:\tCinderella\n\
*INV:\ttell me the story .\n\
*PAR:\tonce upon a time .\n\
@End\n";

    fn parse(content: &str) -> ParseResult {
        parse_transcript_str(content, "sample.txt", &TagConfig::default())
    }

    #[test]
    fn test_parse_sample_transcript() {
        let result = parse(SAMPLE);
        let tags: Vec<&str> = result
            .records
            .iter()
            .map(|r| r.line_information.as_str())
            .collect();

        assert_eq!(
            tags,
            vec!["*INV", "*PAR", "%mor", "%gra", "*PAR", "*INV", "*PAR"]
        );
        assert_eq!(result.lines_read, 15);
        // header group and both scenario markers
        assert_eq!(result.groups_discarded, 3);

        assert_eq!(result.records[0].scenario, "Speech");
        assert_eq!(result.records[0].text, "how is your speech these days ?");
        assert_eq!(result.records[1].text, "&-um it's pretty good .");
        assert_eq!(result.records[4].text, "better than before .  much better .");
        assert_eq!(result.records[6].scenario, "Cinderella");
        assert_eq!(result.records[6].text, "once upon a time . @End");
        assert!(result.records.iter().all(|r| r.source_file == "sample.txt"));
    }

    #[test]
    fn test_group_id_advances_once_per_tag_run() {
        let result = parse(SAMPLE);
        let ids: Vec<u64> = result.records.iter().map(|r| r.line_group_id).collect();

        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
        for pair in ids.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_same_tag_lines_share_group() {
        let content = "*PAR:\tfirst .\n*PAR:\tsecond .\n*INV:\tokay .\n";
        let result = parse(content);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].line_group_id, 1);
        assert_eq!(result.records[0].text, "first . *PAR: second .");
        assert_eq!(result.records[1].line_group_id, 2);
    }

    #[test]
    fn test_utterance_count_skips_annotations() {
        let result = parse(SAMPLE);
        let counts: Vec<u64> = result.records.iter().map(|r| r.utterance_count).collect();

        assert_eq!(counts, vec![1, 2, 2, 2, 3, 4, 5]);
    }

    #[test]
    fn test_lines_before_marker_default_scenario() {
        let content = "*PAR:\thello .\n@G:\tCat\n*PAR:\tthe cat .\n";
        let result = parse(content);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].scenario, DEFAULT_SCENARIO);
        assert_eq!(result.records[1].scenario, "Cat");
        assert_eq!(result.records[1].text, "the cat .");
        assert_eq!(result.records[1].line_group_id, 2);
    }

    #[test]
    fn test_repeated_marker_is_discarded() {
        let content = "@G:\tSpeech\n*PAR:\tit is fine .\n@G:\tSpeech\n*PAR:\tbetter now .\n";
        let result = parse(content);

        assert_eq!(result.groups_discarded, 2);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].text, "it is fine .");
        assert_eq!(result.records[1].text, "better now .");
        assert_eq!(result.records[1].line_group_id, 2);
        assert!(result.records.iter().all(|r| r.scenario == "Speech"));
    }

    #[test]
    fn test_malformed_short_line_joins_current_group() {
        let content = "*PAR:\tthe boy\n*P\n*PAR\n";
        let result = parse(content);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].line_group_id, 1);
        assert_eq!(result.records[0].text, "the boy *P *PAR");
    }

    #[test]
    fn test_empty_input() {
        let result = parse("");
        assert!(result.records.is_empty());
        assert_eq!(result.lines_read, 0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let result = parse("*PAR:\tgood .\r\n*INV:\tyes .\r\n");
        assert_eq!(result.records[0].text, "good .");
        assert_eq!(result.records[1].text, "yes .");
    }
}
