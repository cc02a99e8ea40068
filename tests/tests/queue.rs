use serum_codec::{
    decode_event_queue, decode_queue, decode_request_queue,
    queue::{HEADER_SPAN, NODE_SPAN},
    AccountFlags, CodecError, QueueKind, QueueMode, QueueNode,
};
use serum_codec_tests::{event_node, request_node, QueueBuilder};

fn order_ids(nodes: &[QueueNode]) -> Vec<u128> {
    nodes.iter().map(QueueNode::order_id).collect()
}

#[test]
fn test_full_mode_reads_live_nodes_oldest_first() {
    let builder = QueueBuilder::new(QueueKind::Request, 10)
        .head(3)
        .count(4)
        .seq_num(1_000);
    let queue = decode_queue(&builder.build(), QueueKind::Request, QueueMode::Full).unwrap();

    assert_eq!(queue.kind, QueueKind::Request);
    assert_eq!(queue.header, builder.header());
    assert_eq!(order_ids(&queue.nodes), vec![3, 4, 5, 6]);
}

#[test]
fn test_full_mode_wraps_around() {
    let buffer = QueueBuilder::new(QueueKind::Event, 5).head(3).count(4).build();
    let nodes = decode_event_queue(&buffer, None).unwrap();
    let ids: Vec<u128> = nodes.iter().map(|node| node.order_id).collect();
    assert_eq!(ids, vec![3, 4, 0, 1]);
    assert_eq!(nodes[2], event_node(0));
}

#[test]
fn test_history_mode_reads_newest_first() {
    let buffer = QueueBuilder::new(QueueKind::Request, 10).head(3).count(4).build();
    let nodes = decode_request_queue(&buffer, Some(2)).unwrap();
    assert_eq!(nodes, vec![request_node(6), request_node(5)]);
}

#[test]
fn test_history_mode_returns_stale_slots() {
    // Only slot 0 is live, but history walks back into slots 9 and 8.
    let buffer = QueueBuilder::new(QueueKind::Event, 10).head(0).count(1).build();
    let nodes = decode_event_queue(&buffer, Some(3)).unwrap();
    let ids: Vec<u128> = nodes.iter().map(|node| node.order_id).collect();
    assert_eq!(ids, vec![0, 9, 8]);
}

#[test]
fn test_history_is_capped_at_capacity() {
    let buffer = QueueBuilder::new(QueueKind::Event, 4).head(1).count(2).build();
    assert_eq!(decode_event_queue(&buffer, Some(100)).unwrap().len(), 4);
    assert!(decode_event_queue(&buffer, Some(0)).unwrap().is_empty());
}

#[test]
fn test_full_mode_is_capped_at_capacity() {
    let buffer = QueueBuilder::new(QueueKind::Request, 3).count(8).build();
    let nodes = decode_request_queue(&buffer, None).unwrap();
    assert_eq!(nodes.len(), 3);
}

#[test]
fn test_buffer_without_room_for_a_node_is_empty() {
    let buffer = QueueBuilder::new(QueueKind::Event, 0)
        .count(5)
        .trailing_bytes(NODE_SPAN - 1)
        .build();
    assert_eq!(buffer.len(), HEADER_SPAN + NODE_SPAN - 1);
    let queue = decode_queue(&buffer, QueueKind::Event, QueueMode::Full).unwrap();
    assert!(queue.nodes.is_empty());
    assert_eq!(queue.header.count, 5);
}

#[test]
fn test_partial_trailing_node_is_ignored() {
    let buffer = QueueBuilder::new(QueueKind::Request, 2)
        .count(2)
        .trailing_bytes(40)
        .build();
    assert_eq!(decode_request_queue(&buffer, None).unwrap().len(), 2);
}

#[test]
fn test_uninitialized_queue_is_rejected() {
    let buffer = QueueBuilder::new(QueueKind::Request, 4)
        .head(2)
        .count(2)
        .flags(AccountFlags {
            request_queue: true,
            ..AccountFlags::default()
        })
        .build();
    assert_eq!(
        decode_request_queue(&buffer, None).unwrap_err(),
        CodecError::InvalidQueueFlags(QueueKind::Request)
    );
}

#[test]
fn test_queue_kind_must_match_flags() {
    let buffer = QueueBuilder::new(QueueKind::Request, 4).count(1).build();
    assert_eq!(
        decode_event_queue(&buffer, None).unwrap_err(),
        CodecError::InvalidQueueFlags(QueueKind::Event)
    );
}

#[test]
fn test_header_shorter_than_span_is_malformed() {
    let buffer = QueueBuilder::new(QueueKind::Event, 1).build();
    assert!(matches!(
        decode_event_queue(&buffer[..HEADER_SPAN - 1], None),
        Err(CodecError::MalformedBuffer { .. })
    ));
}

#[test]
fn test_header_padding_is_not_checked() {
    let mut buffer = QueueBuilder::new(QueueKind::Event, 2).count(1).build();
    buffer[..5].fill(0xff);
    buffer[17..21].fill(0xff);
    assert_eq!(decode_event_queue(&buffer, None).unwrap(), vec![event_node(0)]);
}

#[test]
fn test_extra_account_flags_are_tolerated() {
    let buffer = QueueBuilder::new(QueueKind::Event, 2)
        .count(1)
        .flags(AccountFlags {
            market: true,
            ..AccountFlags::queue(QueueKind::Event)
        })
        .build();
    let queue = decode_queue(&buffer, QueueKind::Event, QueueMode::Full).unwrap();
    assert!(queue.header.account_flags.market);
    assert_eq!(queue.nodes.len(), 1);
}
