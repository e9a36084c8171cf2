use strongbox_metadata::*;

fn long_text(len: usize) -> String {
    "Deliver the audited release, including documentation ✓ "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

#[test]
fn test_fund_record_roundtrip_through_cbor() {
    let metadata = TxMetadata::new(
        long_text(90),
        Event::Fund {
            identifier: "PO-2025-001".to_string(),
            label: Some("Indexer maintenance".to_string()),
            description: Some(long_text(300)),
            milestones: vec![
                MilestoneNote {
                    identifier: "m1".to_string(),
                    label: Some("Kickoff".to_string()),
                    description: None,
                    acceptance_criteria: Some(long_text(130)),
                },
                MilestoneNote {
                    identifier: "m2".to_string(),
                    label: None,
                    description: Some(long_text(64)),
                    acceptance_criteria: None,
                },
            ],
        },
    )
    .for_instance("a".repeat(64));

    let bytes = metadata.to_auxiliary_bytes().unwrap();
    let decoded = TxMetadata::from_auxiliary_bytes(&bytes).unwrap();
    assert_eq!(decoded, metadata);
}

#[test]
fn test_every_stored_string_fits_a_chunk() {
    let metadata = TxMetadata::new(
        "ctx",
        Event::Withdraw {
            milestones: vec![WithdrawNote {
                index: 0,
                comment: Some(long_text(200)),
                evidence: vec![long_text(70), "https://example.org/report".to_string()],
            }],
        },
    );

    fn check(node: &Metadatum) {
        match node {
            Metadatum::Text(text) => assert!(text.len() <= CHUNK_SIZE),
            Metadatum::List(items) => items.iter().for_each(check),
            Metadatum::Map(entries) => entries.iter().for_each(|(k, v)| {
                check(k);
                check(v);
            }),
            _ => {}
        }
    }

    let tree = metadata.to_metadatum().unwrap();
    check(&tree);
    assert_eq!(TxMetadata::from_metadatum(&tree).unwrap(), metadata);
}

#[test]
fn test_adjudication_records() {
    for body in [
        Event::Pause {
            milestones: vec![StatusNote {
                index: 1,
                reason: Some("Deliverable disputed".to_string()),
            }],
        },
        Event::Resume {
            milestones: vec![StatusNote {
                index: 1,
                reason: None,
            }],
        },
    ] {
        let metadata = TxMetadata::new("ctx", body.clone());
        let decoded = TxMetadata::from_metadatum(&metadata.to_metadatum().unwrap()).unwrap();
        assert_eq!(decoded.body, body);
        assert_eq!(decoded.body.name(), body.name());
    }
}
