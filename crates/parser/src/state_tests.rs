use super::*;

fn text_chunks(events: &[ParserEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ParserEvent::TextChunk(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn plain_text_outside_tags_is_emitted_verbatim() {
    let mut state = MessageState::default();
    let events = state.feed("0:\"hello world\"\n");
    assert_eq!(text_chunks(&events), vec!["hello world"]);
}

#[test]
fn single_artifact_with_one_file_action() {
    let mut state = MessageState::default();
    let body = concat!(
        "before ",
        r#"<boltArtifact id="a1" title="Demo" type="file">"#,
        r#"<boltAction type="file" filePath="README.md">hello</boltAction>"#,
        "</boltArtifact>",
        " after",
    );
    let frame = format!("0:{}\n", serde_json::to_string(body).unwrap());
    let events = state.feed(&frame);

    assert!(matches!(&events[0], ParserEvent::TextChunk(t) if t == "before "));
    assert!(matches!(&events[1], ParserEvent::ArtifactOpen(a) if a.id == "a1" && a.title == "Demo"));
    assert!(matches!(&events[2], ParserEvent::ActionOpen(Action::File { file_path, .. }) if file_path == "README.md"));
    assert!(matches!(&events[3], ParserEvent::ActionStream(s) if s == "hello"));
    assert!(
        matches!(&events[4], ParserEvent::ActionClose(Action::File { content, .. }) if content == "hello\n")
    );
    assert!(matches!(&events[5], ParserEvent::ArtifactClose(_)));
    assert!(matches!(&events[6], ParserEvent::TextChunk(t) if t == " after"));
}

#[test]
fn split_across_many_tiny_chunks_produces_same_structural_events() {
    let body = concat!(
        r#"<boltArtifact id="a1" title="Demo" type="file">"#,
        r#"<boltAction type="file" filePath="x.ts">const x = 1;</boltAction>"#,
        "</boltArtifact>",
    );
    let frame = format!("0:{}\n", serde_json::to_string(body).unwrap());

    let mut whole = MessageState::default();
    let all_at_once = whole.feed(&frame);

    let mut chunked = MessageState::default();
    let mut streamed = Vec::new();
    for byte in frame.as_bytes().chunks(3) {
        streamed.extend(chunked.feed(std::str::from_utf8(byte).unwrap()));
    }

    let structural = |events: &[ParserEvent]| -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ParserEvent::ActionStream(_) => None,
                ParserEvent::TextChunk(t) if t.is_empty() => None,
                other => Some(format!("{other:?}").split_whitespace().next().unwrap().to_string()),
            })
            .collect()
    };

    assert_eq!(structural(&all_at_once), structural(&streamed));

    let joined_content: String = streamed
        .iter()
        .filter_map(|e| match e {
            ParserEvent::ActionStream(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(joined_content.trim(), "const x = 1;");
}

#[test]
fn shell_action_falls_back_to_first_content_line() {
    let mut state = MessageState::default();
    let body = concat!(
        r#"<boltArtifact id="a1" title="Install" type="file">"#,
        "<boltAction type=\"shell\">npm install\n# comment</boltAction>",
        "</boltArtifact>",
    );
    let frame = format!("0:{}\n", serde_json::to_string(body).unwrap());
    let events = state.feed(&frame);

    let close = events
        .iter()
        .find_map(|e| match e {
            ParserEvent::ActionClose(action @ Action::Shell { .. }) => Some(action.clone()),
            _ => None,
        })
        .expect("shell action close event");
    match close {
        Action::Shell { command, .. } => assert_eq!(command.as_deref(), Some("npm install")),
        _ => unreachable!(),
    }
}

#[test]
fn markdown_file_path_skips_fence_stripping() {
    let mut state = MessageState::default();
    let body = concat!(
        r#"<boltArtifact id="a1" title="Docs" type="file">"#,
        "<boltAction type=\"file\" filePath=\"NOTES.md\">```text\nkeep the fence\n```</boltAction>",
        "</boltArtifact>",
    );
    let frame = format!("0:{}\n", serde_json::to_string(body).unwrap());
    let events = state.feed(&frame);

    let content = events
        .iter()
        .find_map(|e| match e {
            ParserEvent::ActionClose(Action::File { content, .. }) => Some(content.clone()),
            _ => None,
        })
        .expect("file action close event");
    assert!(content.starts_with("```text"));
}

#[test]
fn non_frame_lines_other_than_zero_are_skipped() {
    let mut state = MessageState::default();
    let events = state.feed("2:{\"usage\":{\"tokens\":5}}\n0:\"hi\"\n");
    assert_eq!(text_chunks(&events), vec!["hi"]);
}
