//! Markdown section splitting.

/// One header-delimited section. `level` is 0 for text before the first header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: Option<String>,
    pub level: usize,
    pub content: String,
}

/// Header level of `line`, if it is an ATX header (1-6 '#' then whitespace).
fn header_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    (rest.starts_with(' ') || rest.starts_with('\t')).then_some(hashes)
}

fn header_text(line: &str) -> String {
    line.trim().trim_start_matches('#').trim().trim_end_matches('#').trim().to_string()
}

/// Split on header lines, ignoring anything inside fenced code blocks.
///
/// Each section keeps its header line. A blank preamble is dropped.
pub fn split_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut sections = Vec::new();
    let mut current = Section { header: None, level: 0, content: String::new() };
    let mut in_fence = false;

    for line in lines {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        let level = if in_fence { None } else { header_level(line) };
        if let Some(level) = level {
            let previous = std::mem::replace(
                &mut current,
                Section { header: Some(header_text(line)), level, content: String::new() },
            );
            push_section(&mut sections, previous);
        }
        current.content.push_str(line);
    }
    push_section(&mut sections, current);
    sections
}

fn push_section(sections: &mut Vec<Section>, mut section: Section) {
    if section.header.is_none() && section.content.trim().is_empty() {
        return;
    }
    section.content = section.content.trim().to_string();
    sections.push(section);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_header_section() {
        let sections =
            split_sections("## CrashLoopBackOff\nError: pod keeps restarting. How to fix: check logs.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header.as_deref(), Some("CrashLoopBackOff"));
        assert_eq!(sections[0].level, 2);
        assert!(sections[0].content.starts_with("## CrashLoopBackOff\nError"));
    }

    #[test]
    fn preamble_is_kept_when_not_blank() {
        let sections = split_sections("intro line\n\n# One\nbody\n### Three ###\nmore\n");
        let headers: Vec<_> = sections.iter().map(|s| (s.header.clone(), s.level)).collect();
        assert_eq!(
            headers,
            vec![(None, 0), (Some("One".to_string()), 1), (Some("Three".to_string()), 3)]
        );
        assert_eq!(sections[0].content, "intro line");

        let no_preamble = split_sections("\n\n# One\nbody\n");
        assert_eq!(no_preamble.len(), 1);
    }

    #[test]
    fn hashes_without_space_and_fenced_comments_are_not_headers() {
        let text = "# Setup\n#hashtag\n```bash\n# install deps\nmake\n```\n####### seven\n";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains("# install deps"));
    }

    #[test]
    fn document_without_headers_is_one_section() {
        let sections = split_sections("just some notes\nacross lines\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].level, 0);
        assert_eq!(sections[0].header, None);
    }
}
