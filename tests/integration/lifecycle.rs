use crate::*;

use bytes::Bytes;

/// Empty frames are rejected synchronously and never queued.
#[tokio::test]
async fn test_empty_frame_rejected() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(256);
    let mut svc = start_service(link.clone()).await?;

    assert_eq!(
        svc.enqueue(&[], Priority::Normal),
        Err(TransportError::InvalidArgument)
    );
    assert_eq!(
        svc.enqueue(&Vec::new(), Priority::Emergency),
        Err(TransportError::InvalidArgument)
    );
    assert_eq!(svc.status().queued_frames, 0);
    assert!(sends.stays_quiet().await);

    svc.shutdown().await;
    Ok(())
}

/// Shutdown while the only chunk is never acknowledged: the engine exits
/// promptly, pending frames are dropped, and nothing else is sent.
#[tokio::test]
async fn test_shutdown_while_awaiting_ack() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(256);
    let mut svc = start_service(link.clone()).await?;
    let status = svc.subscribe_status().context("no status")?;

    svc.enqueue(&payload(600), Priority::Normal)?;
    svc.enqueue(&payload(50), Priority::Normal)?;
    let first = sends.next().await?;

    tokio::time::timeout(WAIT, svc.shutdown())
        .await
        .context("shutdown did not complete")?;

    let s = status.borrow().clone();
    assert!(!s.running);
    assert_eq!(s.queued_frames, 0);
    assert_eq!(s.resume_offset, None);
    assert!(!link.has_sink());

    // A late ack has nowhere to go
    link.ack(first.id);
    assert!(sends.stays_quiet().await);
    assert_eq!(
        svc.enqueue(&payload(1), Priority::Normal),
        Err(TransportError::NotReady)
    );
    Ok(())
}

/// An acknowledgment that arrives just before shutdown must not release
/// the next chunk.
#[tokio::test]
async fn test_ack_racing_shutdown_sends_nothing_more() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(64);
    let mut svc = start_service(link.clone()).await?;
    let status = svc.subscribe_status().context("no status")?;

    svc.enqueue(&payload(300), Priority::Normal)?;
    let first = sends.next().await?;

    link.ack(first.id);
    tokio::time::timeout(WAIT, svc.shutdown())
        .await
        .context("shutdown did not complete")?;

    assert!(sends.stays_quiet().await, "chunk sent after shutdown");
    let s = status.borrow().clone();
    assert!(!s.running);
    assert_eq!(s.counters.chunks_sent, 1);
    Ok(())
}

#[tokio::test]
async fn test_frame_enqueued_just_before_shutdown_is_dropped() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(256);
    let mut svc = start_service(link.clone()).await?;
    tokio::task::yield_now().await;

    svc.enqueue(&payload(10), Priority::Normal)?;
    tokio::time::timeout(WAIT, svc.shutdown())
        .await
        .context("shutdown did not complete")?;

    assert!(sends.stays_quiet().await, "frame sent after shutdown");
    Ok(())
}

#[tokio::test]
async fn test_enqueue_before_init_not_ready() {
    init_tracing();
    let (link, _sends) = ScriptedLink::new(256);
    let svc = SatCommService::new(test_config(), Arc::new(ScriptedProvider::ready(link)));
    assert_eq!(
        svc.enqueue(&payload(10), Priority::Normal),
        Err(TransportError::NotReady)
    );
    assert_eq!(svc.network_state(), NetworkState::Disabled);
    assert_eq!(svc.service_status(), ServiceStatus::Unavailable);
}

#[tokio::test]
async fn test_init_fails_without_link() {
    init_tracing();
    let provider = ScriptedProvider::new(None, Some(ServiceStatus::Available));
    let mut svc = SatCommService::new(test_config(), Arc::new(provider));
    assert!(matches!(svc.init().await, Err(TransportError::InitFailed(_))));
}

#[tokio::test]
async fn test_init_fails_when_subsystem_failed() {
    init_tracing();
    let (link, _sends) = ScriptedLink::new(256);
    let provider = ScriptedProvider::new(Some(link.clone()), Some(ServiceStatus::Failed));
    let mut svc = SatCommService::new(test_config(), Arc::new(provider));
    assert!(matches!(svc.init().await, Err(TransportError::InitFailed(_))));
    assert!(!link.has_sink());
}

#[tokio::test]
async fn test_init_times_out_then_retries() -> Result<()> {
    init_tracing();
    let (link, mut sends) = ScriptedLink::new(256);
    let mut config = test_config();
    config.satcom.init_timeout_ms = 100;

    let silent = ScriptedProvider::new(Some(link.clone()), None);
    let mut svc = SatCommService::new(config.clone(), Arc::new(silent));
    assert_eq!(
        svc.init().await,
        Err(TransportError::InitTimeout(Duration::from_millis(100)))
    );
    assert!(!link.has_sink());

    // A fresh attempt against a responsive provider succeeds
    let mut svc = SatCommService::new(config, Arc::new(ScriptedProvider::ready(link.clone())));
    svc.init().await?;
    svc.enqueue(&payload(3), Priority::Normal)?;
    assert_eq!(sends.next().await?.data.len(), 3);
    svc.shutdown().await;
    Ok(())
}

/// Abort goes to the link only; local pacing state is untouched.
#[tokio::test]
async fn test_abort_leaves_pacing_state() -> Result<()> {
    let (link, mut sends) = ScriptedLink::new(100);
    let mut svc = start_service(link.clone()).await?;
    let mut status = svc.subscribe_status().context("no status")?;

    svc.enqueue(&payload(250), Priority::Normal)?;
    svc.enqueue(&payload(10), Priority::Normal)?;
    let first = sends.next().await?;
    let before = wait_status(&mut status, |s| {
        s.in_flight == Some(first.id) && s.queued_frames == 1
    })
    .await?;

    svc.abort()?;
    assert_eq!(link.aborts(), 1);
    let after = svc.status();
    assert_eq!(after.in_flight, before.in_flight);
    assert_eq!(after.queued_frames, 1);
    assert_eq!(after.resume_offset, Some(0));

    // Pacing continues once the link settles the chunk
    link.nack(first.id, LinkError::Aborted);
    assert_eq!(sends.next().await?.data.len(), 100);

    svc.shutdown().await;
    Ok(())
}

/// Downlink data, signal, and coverage notifications pass straight through.
#[tokio::test]
async fn test_notifications_forwarded_to_application() -> Result<()> {
    let (link, _sends) = ScriptedLink::new(256);
    let mut svc = start_service(link.clone()).await?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let (t1, t2, t3, t4) = (tx.clone(), tx.clone(), tx.clone(), tx);
    svc.set_callbacks(
        SatCommCallbacks::default()
            .on_incoming_data(move |d| {
                let _ = t1.send(format!("data:{}", d.len()));
            })
            .on_signal_strength(move |s| {
                let _ = t2.send(format!("signal:{s:?}"));
            })
            .on_coverage_available(move |c| {
                let _ = t3.send(format!("coverage:{c}"));
            })
            .on_capabilities(move |c| {
                let _ = t4.send(format!("mtu:{}", c.max_data_size));
            }),
    );

    link.deliver(LinkEvent::IncomingData(Bytes::new()));
    link.deliver(LinkEvent::IncomingData(Bytes::from_static(b"\x01\x02\x03")));
    link.deliver(LinkEvent::SignalStrength(SignalStrength::Great));
    link.deliver(LinkEvent::CoverageAvailable(false));
    link.announce_mtu(512);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let msg = tokio::time::timeout(WAIT, rx.recv())
            .await
            .context("callback not invoked")?
            .context("callbacks dropped")?;
        seen.push(msg);
    }
    assert_eq!(
        seen,
        vec!["data:3", "signal:Great", "coverage:false", "mtu:512"]
    );

    svc.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_link_queries_pass_through() -> Result<()> {
    let (link, _sends) = ScriptedLink::new(320);
    let mut svc = start_service(link).await?;

    assert!(svc.is_supported()?);
    assert_eq!(svc.capabilities()?.max_data_size, 320);
    assert_eq!(svc.signal_strength()?, SignalStrength::Moderate);
    assert_eq!(svc.network_state(), NetworkState::InService);
    assert_eq!(svc.service_status(), ServiceStatus::Available);
    svc.enable_ntn(true, false, "89014103211118510720")?;
    svc.enable_cellular_scan(false)?;

    let selection = SystemSelectionSpecifier {
        mcc: "001".to_string(),
        mnc: "01".to_string(),
        bands: vec![23],
        earfcns: vec![],
    };
    svc.update_system_selection(&[selection])?;
    assert_eq!(
        svc.update_system_selection(&[]),
        Err(TransportError::Link(LinkError::InvalidArgument))
    );

    svc.shutdown().await;
    Ok(())
}

/// A JSON config file drives the engine's tuning.
#[tokio::test]
async fn test_service_from_json_config() -> Result<()> {
    let path = std::env::temp_dir().join(format!("satlink-it-{}.json", std::process::id()));
    let json = serde_json::json!({
        "satcom": { "init_timeout_ms": 1000 },
        "data_plane": { "app_id": 7, "max_tx_pdu_override": 64 },
        "uplink": { "ack_timeout_ms": 5000 }
    });
    std::fs::write(&path, json.to_string())?;
    let config = SatlinkConfig::load_from(&path);
    let _ = std::fs::remove_file(&path);
    let config = config?;
    assert_eq!(config.data_plane.app_id, 7);

    let (link, mut sends) = ScriptedLink::new(256);
    let mut svc = start_service_with(link.clone(), config).await?;
    svc.enqueue(&payload(100), Priority::Normal)?;
    let first = sends.next().await?;
    assert_eq!(first.data.len(), 64);
    link.ack(first.id);
    assert_eq!(sends.next().await?.data.len(), 36);

    svc.shutdown().await;
    Ok(())
}
