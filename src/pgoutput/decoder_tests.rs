#[cfg(test)]
mod tests {
    use super::super::builder::{MessageBuilder, TupleValue};
    use super::super::decoder::*;
    use crate::decoding::{type_oids, Datum, Lsn};
    use crate::Error;
    use bytes::{BufMut, Bytes, BytesMut};

    fn builder() -> MessageBuilder {
        MessageBuilder::new().add_relation(
            100,
            "public",
            "users",
            vec![
                ("id", type_oids::INT4, true),
                ("name", type_oids::TEXT, false),
                ("active", type_oids::BOOL, false),
            ],
        )
    }

    fn text(value: &str) -> Datum {
        Datum::Inline(Bytes::copy_from_slice(value.as_bytes()))
    }

    #[test]
    fn test_decode_begin_message() {
        let mut decoder = PgOutputDecoder::new();
        let msg = builder().with_lsn(2000).begin_message(12345);

        let result = decoder.decode(&msg).unwrap();
        assert_eq!(
            result,
            Some(PgOutputMessage::Begin {
                xid: 12345,
                final_lsn: Lsn(2000)
            })
        );
        assert_eq!(decoder.current_xid(), Some(12345));
        assert_eq!(decoder.current_lsn(), Some(Lsn(2100)));
    }

    #[test]
    fn test_decode_commit_message() {
        let mut decoder = PgOutputDecoder::new();
        let b = builder().with_lsn(3000);
        decoder.decode(&b.begin_message(1)).unwrap();

        let result = decoder.decode(&b.commit_message()).unwrap();
        assert_eq!(
            result,
            Some(PgOutputMessage::Commit {
                commit_lsn: Lsn(3000),
                end_lsn: Lsn(3100)
            })
        );
        assert_eq!(decoder.current_xid(), None);
    }

    #[test]
    fn test_decode_relation_message() {
        let mut decoder = PgOutputDecoder::new();

        match decoder.decode(&builder().relation_message(100)).unwrap() {
            Some(PgOutputMessage::Relation(relation)) => {
                assert_eq!(relation.id, 100);
                assert_eq!(relation.schema, "public");
                assert_eq!(relation.table, "users");
                assert_eq!(relation.columns.len(), 3);
                assert!(relation.columns[0].is_key);
                assert_eq!(relation.columns[2].name, "active");
                assert_eq!(relation.columns[2].type_id, type_oids::BOOL);
            }
            other => panic!("Expected Relation message, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_insert_message() {
        let mut decoder = PgOutputDecoder::new();
        let msg = builder().insert_message(
            100,
            vec![TupleValue::text("42"), TupleValue::Null, TupleValue::text("t")],
        );

        assert_eq!(
            decoder.decode(&msg).unwrap(),
            Some(PgOutputMessage::Insert {
                rel_id: 100,
                new: vec![text("42"), Datum::Null, text("t")],
            })
        );
    }

    #[test]
    fn test_decode_update_with_old_tuple() {
        let mut decoder = PgOutputDecoder::new();
        let msg = builder().update_message(
            100,
            Some(vec![Some("10").into(), Some("Old Name").into(), Some("f").into()]),
            vec![Some("10").into(), Some("New Name").into(), TupleValue::UnchangedToast],
        );

        match decoder.decode(&msg).unwrap() {
            Some(PgOutputMessage::Update { rel_id, old, new }) => {
                assert_eq!(rel_id, 100);
                assert_eq!(old.unwrap()[1], text("Old Name"));
                assert_eq!(new, vec![text("10"), text("New Name"), Datum::UnchangedToast]);
            }
            other => panic!("Expected Update message, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_update_without_old_tuple() {
        let mut decoder = PgOutputDecoder::new();
        let msg = builder().update_message(100, None, vec![Some("1").into(), TupleValue::Null, TupleValue::Null]);

        match decoder.decode(&msg).unwrap() {
            Some(PgOutputMessage::Update { old, new, .. }) => {
                assert!(old.is_none());
                assert_eq!(new.len(), 3);
            }
            other => panic!("Expected Update message, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_delete_message() {
        let mut decoder = PgOutputDecoder::new();
        let msg = builder().delete_message(100, Some(vec![Some("99").into(), TupleValue::Null, TupleValue::Null]));

        assert_eq!(
            decoder.decode(&msg).unwrap(),
            Some(PgOutputMessage::Delete {
                rel_id: 100,
                old: Some(vec![text("99"), Datum::Null, Datum::Null]),
            })
        );
    }

    #[test]
    fn test_decode_delete_without_identity() {
        let mut decoder = PgOutputDecoder::new();
        let msg = builder().delete_message(100, None);

        assert_eq!(
            decoder.decode(&msg).unwrap(),
            Some(PgOutputMessage::Delete { rel_id: 100, old: None })
        );
    }

    #[test]
    fn test_truncate_and_keepalive_are_skipped() {
        let mut decoder = PgOutputDecoder::new();
        let b = builder();
        assert!(decoder.decode(&b.truncate_message(vec![100, 101])).unwrap().is_none());
        assert!(decoder.decode(&b.keepalive_message()).unwrap().is_none());
        assert!(decoder.decode(&[]).unwrap().is_none());
    }

    #[test]
    fn test_short_header_is_rejected() {
        let mut decoder = PgOutputDecoder::new();
        let result = decoder.decode(&[b'w', 0, 0, 0]);
        assert!(matches!(result, Err(Error::InvalidMessage { .. })));
    }

    #[test]
    fn test_truncated_text_value_is_rejected() {
        let mut decoder = PgOutputDecoder::new();
        let mut msg = BytesMut::from(&builder().insert_message(100, vec![TupleValue::text("hello")])[..]);
        msg.truncate(msg.len() - 2);

        assert!(matches!(decoder.decode(&msg), Err(Error::InvalidMessage { .. })));
    }

    #[test]
    fn test_binary_values_are_rejected() {
        let mut decoder = PgOutputDecoder::new();
        let mut msg = BytesMut::new();
        msg.put_u8(b'w');
        msg.put_u64(0);
        msg.put_u64(0);
        msg.put_i64(0);
        msg.put_u8(b'I');
        msg.put_u32(100);
        msg.put_u8(b'N');
        msg.put_u16(1);
        msg.put_u8(b'b');
        msg.put_u32(4);
        msg.put_i32(42);

        assert!(matches!(decoder.decode(&msg), Err(Error::InvalidMessage { .. })));
    }

    #[test]
    fn test_unterminated_relation_name_is_rejected() {
        let mut decoder = PgOutputDecoder::new();
        let mut msg = BytesMut::new();
        msg.put_u8(b'w');
        msg.put_u64(0);
        msg.put_u64(0);
        msg.put_i64(0);
        msg.put_u8(b'R');
        msg.put_u32(7);
        msg.put_slice(b"public");

        assert!(matches!(decoder.decode(&msg), Err(Error::InvalidMessage { .. })));
    }
}
