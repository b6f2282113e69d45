use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ceknomor_core::batch::TableSource;
use ceknomor_core::clients::Verifier;
use ceknomor_core::error::VerifyError;
use ceknomor_core::model::{
    IdentityRecord, Resolution, SimRecord, VerificationKind, VerificationRequest,
    VerificationResult,
};
use ceknomor_runtime::interaction::messages;
use ceknomor_runtime::{
    ConversationId, InboundEvent, InteractionSession, MessagingGateway, Phase, PromptOption,
    SessionCommand, SessionServices,
};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Url;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivered {
    Prompt(String, Vec<String>),
    File(String, Vec<u8>),
}

#[derive(Default)]
struct FakeGateway {
    delivered: Mutex<Vec<Delivered>>,
    fail_files: AtomicBool,
}

impl FakeGateway {
    fn failing_files() -> Self {
        let gateway = Self::default();
        gateway.fail_files.store(true, Ordering::SeqCst);
        gateway
    }

    fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn texts(&self) -> Vec<String> {
        self.delivered()
            .into_iter()
            .filter_map(|d| match d {
                Delivered::Prompt(text, _) => Some(text),
                Delivered::File(..) => None,
            })
            .collect()
    }

    fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered()
            .into_iter()
            .filter_map(|d| match d {
                Delivered::File(name, content) => Some((name, content)),
                Delivered::Prompt(..) => None,
            })
            .collect()
    }

    fn push(&self, item: Delivered) -> Result<()> {
        self.delivered
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(item);
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for FakeGateway {
    async fn deliver_prompt(&self, text: &str, options: &[PromptOption]) -> Result<()> {
        let payloads = options.iter().map(|o| o.payload.clone()).collect();
        self.push(Delivered::Prompt(text.to_string(), payloads))
    }

    async fn deliver_file(&self, file_name: &str, content: &[u8]) -> Result<()> {
        if self.fail_files.load(Ordering::SeqCst) {
            return Err(anyhow!("upload refused"));
        }
        self.push(Delivered::File(file_name.to_string(), content.to_vec()))
    }
}

/// SIM verifier that counts calls; numbers ending in 9 fail.
#[derive(Default)]
struct FakeSim {
    calls: AtomicUsize,
}

#[async_trait]
impl Verifier for FakeSim {
    fn kind(&self) -> VerificationKind {
        VerificationKind::SimStatus
    }

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.to_string().ends_with('9') {
            return VerificationResult::failure(request.clone(), VerifyError::HttpStatus(500));
        }
        VerificationResult::success(
            request.clone(),
            Resolution::SimStatus(SimRecord {
                card_status: "ACTIVE".into(),
                activation_status: "DONE".into(),
                iccid_last4: "5678".into(),
            }),
        )
    }
}

struct FakeIdentity;

#[async_trait]
impl Verifier for FakeIdentity {
    fn kind(&self) -> VerificationKind {
        VerificationKind::Identity
    }

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        VerificationResult::success(
            request.clone(),
            Resolution::Identity(IdentityRecord::new(
                "ABC".into(),
                vec!["0811".into(), "0822".into()],
            )),
        )
    }
}

struct FakeTables;

#[async_trait]
impl TableSource for FakeTables {
    async fn fetch(&self, url: &Url) -> Result<String, VerifyError> {
        if url.path().ends_with("missing.csv") {
            return Err(VerifyError::HttpStatus(404));
        }
        Ok("NIK,KK\n3201,3202\n3301\n".to_string())
    }
}

fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .and_then(|d| d.and_hms_opt(7, 8, 9))
        .expect("valid timestamp")
}

fn session(sim: Arc<FakeSim>) -> InteractionSession {
    InteractionSession::new(SessionServices {
        identity: Arc::new(FakeIdentity),
        sim_status: sim,
        tables: Arc::new(FakeTables),
    })
    .with_clock(fixed_clock)
}

const CHAT: ConversationId = ConversationId(42);

/// Phase of a conversation; a dropped idle entry reads as `Idle`.
async fn phase(session: &InteractionSession, id: ConversationId) -> Phase {
    match session.registry().get(&id).await {
        Some(state) => state.lock().await.phase(),
        None => Phase::Idle,
    }
}

fn command(command: SessionCommand) -> InboundEvent {
    InboundEvent::Command(command)
}

#[tokio::test]
async fn format_choice_without_pending_batch_produces_no_file() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(CHAT, InboundEvent::ButtonPress("csv".into()), &gateway)
        .await?;

    assert!(gateway.files().is_empty());
    assert_eq!(
        gateway.texts(),
        vec![messages::session_error(&VerifyError::NoPendingBatch)]
    );
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn inline_sim_batch_is_exported_after_format_choice() -> Result<()> {
    let sim = Arc::new(FakeSim::default());
    let session = session(sim.clone());
    let gateway = FakeGateway::default();

    session
        .handle_event(
            CHAT,
            command(SessionCommand::SimStatus("0811 08129".into())),
            &gateway,
        )
        .await?;
    assert_eq!(phase(&session, CHAT).await, Phase::AwaitingFormatChoice);
    assert_eq!(sim.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        gateway.delivered(),
        vec![Delivered::Prompt(
            messages::CHOOSE_FORMAT.into(),
            vec!["csv".into(), "txt".into(), "excel".into()]
        )]
    );

    session
        .handle_event(CHAT, InboundEvent::ButtonPress("txt".into()), &gateway)
        .await?;

    assert_eq!(sim.calls.load(Ordering::SeqCst), 2);
    let files = gateway.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "cekstatus_2024-05-06_07-08-09.txt");
    let text = String::from_utf8(files[0].1.clone())?;
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "MSISDN | Card Status | Activation Status | Last 4 ICCID | Message",
            "62811 | ACTIVE | DONE | 5678 | ",
            "628129 |  |  |  | HTTP Error 500",
        ]
    );
    let texts = gateway.texts();
    assert_eq!(texts[1], messages::PROCESSING);
    assert_eq!(texts.last().map(String::as_str), Some(messages::DONE));
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn awaited_text_becomes_the_batch() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(CHAT, command(SessionCommand::CheckIdentity(String::new())), &gateway)
        .await?;
    assert_eq!(
        phase(&session, CHAT).await,
        Phase::AwaitingText(VerificationKind::Identity)
    );

    session
        .handle_event(CHAT, InboundEvent::Text("3201 3202\n3301;3302".into()), &gateway)
        .await?;
    session
        .handle_event(CHAT, InboundEvent::ButtonPress("csv".into()), &gateway)
        .await?;

    let files = gateway.files();
    assert_eq!(files[0].0, "ceknik_2024-05-06_07-08-09.csv");
    let mut reader = csv::Reader::from_reader(files[0].1.as_slice());
    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1].iter().collect::<Vec<_>>(),
        vec!["3301", "3302", "Berhasil", "0811, 0822", "", "1"]
    );
    Ok(())
}

#[tokio::test]
async fn single_identity_check_replies_inline() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(
            CHAT,
            command(SessionCommand::CheckIdentity("3201 3202".into())),
            &gateway,
        )
        .await?;
    assert_eq!(gateway.texts(), vec!["NIK: ABC\nNomor: 0811\n0822\nSisa: 1"]);
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);

    session
        .handle_event(CHAT, command(SessionCommand::CheckIdentity("3201".into())), &gateway)
        .await?;
    assert_eq!(gateway.texts()[1], messages::CEKNIK_USAGE);
    Ok(())
}

#[tokio::test]
async fn url_batches_require_https_and_surface_fetch_errors() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(
            CHAT,
            command(SessionCommand::IdentityUrl("http://example.com/a.csv".into())),
            &gateway,
        )
        .await?;
    assert!(gateway.texts()[0].contains("docs.google.com/spreadsheets"));
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);

    session
        .handle_event(
            CHAT,
            command(SessionCommand::IdentityUrl("https://example.com/missing.csv".into())),
            &gateway,
        )
        .await?;
    session
        .handle_event(CHAT, InboundEvent::ButtonPress("excel".into()), &gateway)
        .await?;
    assert!(gateway.files().is_empty());
    assert_eq!(
        gateway.texts().last().cloned(),
        Some(messages::session_error(&VerifyError::HttpStatus(404)))
    );
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn url_batch_with_short_row_exports_every_row() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(
            CHAT,
            command(SessionCommand::IdentityUrl("https://example.com/ok.csv".into())),
            &gateway,
        )
        .await?;
    session
        .handle_event(CHAT, InboundEvent::ButtonPress("excel".into()), &gateway)
        .await?;

    let files = gateway.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "ceknik_2024-05-06_07-08-09.xlsx");
    assert!(files[0].1.starts_with(b"PK"));
    Ok(())
}

#[tokio::test]
async fn finished_conversations_leave_the_registry() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(CHAT, command(SessionCommand::SimStatus("0811".into())), &gateway)
        .await?;
    assert_eq!(session.registry().len().await, 1);

    session
        .handle_event(CHAT, InboundEvent::ButtonPress("csv".into()), &gateway)
        .await?;
    assert_eq!(gateway.files().len(), 1);
    assert!(session.registry().is_empty().await);

    session
        .handle_event(CHAT, command(SessionCommand::Help), &gateway)
        .await?;
    assert!(session.registry().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn unknown_format_payload_keeps_the_batch() -> Result<()> {
    let sim = Arc::new(FakeSim::default());
    let session = session(sim.clone());
    let gateway = FakeGateway::default();

    session
        .handle_event(CHAT, command(SessionCommand::SimStatus("0811".into())), &gateway)
        .await?;
    session
        .handle_event(CHAT, InboundEvent::ButtonPress("pdf".into()), &gateway)
        .await?;

    assert_eq!(phase(&session, CHAT).await, Phase::AwaitingFormatChoice);
    assert_eq!(sim.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        gateway.delivered().last().cloned(),
        Some(Delivered::Prompt(
            messages::UNKNOWN_FORMAT.into(),
            vec!["csv".into(), "txt".into(), "excel".into()]
        ))
    );

    session
        .handle_event(CHAT, InboundEvent::ButtonPress("txt".into()), &gateway)
        .await?;
    assert_eq!(gateway.files().len(), 1);
    assert_eq!(sim.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn second_batch_replaces_the_first() -> Result<()> {
    let sim = Arc::new(FakeSim::default());
    let session = session(sim.clone());
    let gateway = FakeGateway::default();

    session
        .handle_event(CHAT, command(SessionCommand::SimStatus("0811".into())), &gateway)
        .await?;
    session
        .handle_event(CHAT, command(SessionCommand::SimStatus("0822 0833".into())), &gateway)
        .await?;
    assert!(gateway.texts().contains(&messages::BATCH_REPLACED.to_string()));

    session
        .handle_event(CHAT, InboundEvent::ButtonPress("csv".into()), &gateway)
        .await?;
    assert_eq!(sim.calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn failed_upload_keeps_results_for_another_format() -> Result<()> {
    let sim = Arc::new(FakeSim::default());
    let session = session(sim.clone());
    let broken = FakeGateway::failing_files();

    session
        .handle_event(CHAT, command(SessionCommand::SimStatus("0811".into())), &broken)
        .await?;
    session
        .handle_event(CHAT, InboundEvent::ButtonPress("csv".into()), &broken)
        .await?;
    assert_eq!(phase(&session, CHAT).await, Phase::AwaitingFormatChoice);
    assert!(broken
        .texts()
        .last()
        .is_some_and(|t| t.contains("upload refused")));

    let gateway = FakeGateway::default();
    session
        .handle_event(CHAT, InboundEvent::ButtonPress("txt".into()), &gateway)
        .await?;
    assert_eq!(gateway.files().len(), 1);
    // The lookups ran once; the retry reused their results
    assert_eq!(sim.calls.load(Ordering::SeqCst), 1);
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn cancel_and_unrecognized_text() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();

    session
        .handle_event(CHAT, InboundEvent::Text("halo".into()), &gateway)
        .await?;
    session
        .handle_event(CHAT, command(SessionCommand::SimStatus(String::new())), &gateway)
        .await?;
    session
        .handle_event(CHAT, command(SessionCommand::Cancel), &gateway)
        .await?;
    session
        .handle_event(CHAT, command(SessionCommand::Cancel), &gateway)
        .await?;

    assert_eq!(
        gateway.texts(),
        vec![
            messages::UNRECOGNIZED.to_string(),
            messages::ask_for_text(VerificationKind::SimStatus).to_string(),
            messages::CANCELLED.to_string(),
            messages::NOTHING_TO_CANCEL.to_string(),
        ]
    );
    assert_eq!(phase(&session, CHAT).await, Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn conversations_do_not_share_pending_batches() -> Result<()> {
    let session = session(Arc::default());
    let gateway = FakeGateway::default();
    let other = ConversationId(7);

    session
        .handle_event(CHAT, command(SessionCommand::SimStatus("0811".into())), &gateway)
        .await?;
    session
        .handle_event(other, InboundEvent::ButtonPress("csv".into()), &gateway)
        .await?;

    assert!(gateway.files().is_empty());
    assert_eq!(phase(&session, CHAT).await, Phase::AwaitingFormatChoice);
    assert_eq!(phase(&session, other).await, Phase::Idle);
    Ok(())
}
