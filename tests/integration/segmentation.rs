use crate::*;

/// 600 bytes at MTU 256: three chunks, each released only by the previous ack.
#[tokio::test]
async fn test_frame_split_at_known_mtu() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(256);
    let mut svc = start_service(link.clone()).await?;
    let data = payload(600);

    svc.enqueue(&data, Priority::Normal)?;

    let first = sends.next().await?;
    assert_eq!(first.data.len(), 256);
    assert!(sends.stays_quiet().await, "second chunk sent before first ack");

    link.ack(first.id);
    let second = sends.next().await?;
    assert_eq!(second.data.len(), 256);
    assert!(sends.stays_quiet().await, "third chunk sent before second ack");

    link.ack(second.id);
    let third = sends.next().await?;
    assert_eq!(third.data.len(), 88);
    link.ack(third.id);

    let joined: Vec<u8> = [first.data, second.data, third.data].concat();
    assert_eq!(joined, data);
    assert_eq!(link.overlapping_sends(), 0);

    svc.shutdown().await;
    Ok(())
}

/// Unknown MTU and a capability query that also says 0: fall back to 256.
#[tokio::test]
async fn test_fallback_mtu_when_link_reports_none() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(0);
    let mut svc = start_service(link.clone()).await?;
    let mut status = svc.subscribe_status().context("no status")?;

    svc.enqueue(&payload(100), Priority::Normal)?;
    let chunk = sends.next().await?;
    assert_eq!(chunk.data.len(), 100);

    let s = wait_status(&mut status, |s| s.in_flight == Some(chunk.id)).await?;
    assert_eq!(s.mtu, 256);
    // Once at init, once when the first chunk needed a size
    assert_eq!(link.capability_queries(), 2);

    // The fallback sticks; a larger frame is cut at 256 without re-querying
    link.ack(chunk.id);
    svc.enqueue(&payload(300), Priority::Normal)?;
    let next = sends.next().await?;
    assert_eq!(next.data.len(), 256);
    assert_eq!(link.capability_queries(), 2);

    svc.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_capability_query_error_uses_fallback() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(0);
    link.set_capability_result(Err(LinkError::NotSupported));
    let mut config = test_config();
    config.uplink.fallback_mtu = 128;
    let mut svc = start_service_with(link.clone(), config).await?;

    svc.enqueue(&payload(200), Priority::Normal)?;
    let first = sends.next().await?;
    assert_eq!(first.data.len(), 128);
    link.ack(first.id);
    assert_eq!(sends.next().await?.data.len(), 72);

    svc.shutdown().await;
    Ok(())
}

/// A capability notification changes the size of the very next chunk.
#[tokio::test]
async fn test_mtu_change_mid_frame() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(200);
    let mut svc = start_service(link.clone()).await?;
    let data = payload(500);

    svc.enqueue(&data, Priority::Normal)?;
    let first = sends.next().await?;
    assert_eq!(first.data.len(), 200);

    link.announce_mtu(120);
    link.ack(first.id);
    let second = sends.next().await?;
    assert_eq!(second.data.len(), 120);
    link.ack(second.id);
    let third = sends.next().await?;
    assert_eq!(third.data.len(), 120);
    link.ack(third.id);
    let fourth = sends.next().await?;
    assert_eq!(fourth.data.len(), 60);

    assert_eq!(
        [first.data, second.data, third.data, fourth.data].concat(),
        data
    );

    svc.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_pdu_override_caps_chunk_size() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(256);
    let mut config = test_config();
    config.data_plane.max_tx_pdu_override = Some(100);
    let mut svc = start_service_with(link.clone(), config).await?;

    svc.enqueue(&payload(250), Priority::Normal)?;
    let mut sizes = Vec::new();
    for _ in 0..3 {
        let chunk = sends.next().await?;
        sizes.push(chunk.data.len());
        link.ack(chunk.id);
    }
    assert_eq!(sizes, vec![100, 100, 50]);

    svc.shutdown().await;
    Ok(())
}

/// Frames go out in submission order and keep their priority.
#[tokio::test]
async fn test_frames_sent_in_order_with_priority() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(64);
    let mut svc = start_service(link.clone()).await?;
    let (callbacks, mut acks) = ack_callbacks();
    svc.set_callbacks(callbacks);

    let a = payload(100);
    let b = vec![0xEE; 30];
    svc.enqueue(&a, Priority::Emergency)?;
    svc.enqueue(&b, Priority::Normal)?;

    let mut chunks = Vec::new();
    for _ in 0..3 {
        let chunk = sends.next().await?;
        link.ack(chunk.id);
        let (result, id) = acks.next().await?;
        assert_eq!(result, Ok(()));
        assert_eq!(id, chunk.id);
        chunks.push(chunk);
    }

    let sizes: Vec<usize> = chunks.iter().map(|c| c.data.len()).collect();
    assert_eq!(sizes, vec![64, 36, 30]);
    assert_eq!(chunks[0].priority, Priority::Emergency);
    assert_eq!(chunks[1].priority, Priority::Emergency);
    assert_eq!(chunks[2].priority, Priority::Normal);
    assert_eq!([chunks[0].data.clone(), chunks[1].data.clone()].concat(), a);
    assert_eq!(chunks[2].data, b);
    assert_eq!(link.overlapping_sends(), 0);

    svc.shutdown().await;
    Ok(())
}
