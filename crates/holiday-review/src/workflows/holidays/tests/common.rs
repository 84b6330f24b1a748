use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::workflows::holidays::domain::{InputFile, MONTH_LABELS};
use crate::workflows::holidays::{
    review_router, AssignmentSolver, ComputeForm, ComputeRequest, ReviewService, TransportError,
};

pub(super) type Reply = Result<Vec<u8>, TransportError>;

/// Solver whose responses are released by the test through oneshot senders,
/// handed out in the order computations are dispatched.
#[derive(Default)]
pub(super) struct GatedSolver {
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    requests: Mutex<Vec<ComputeRequest>>,
    template_calls: AtomicUsize,
}

impl GatedSolver {
    pub(super) fn gate(&self) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.replies.lock().expect("replies").push_back(receiver);
        sender
    }

    /// Queues a reply that is available immediately.
    pub(super) fn reply(&self, reply: Reply) {
        let _ = self.gate().send(reply);
    }

    pub(super) fn requests(&self) -> Vec<ComputeRequest> {
        self.requests.lock().expect("requests").clone()
    }

    pub(super) fn template_calls(&self) -> usize {
        self.template_calls.load(Ordering::SeqCst)
    }
}

impl AssignmentSolver for GatedSolver {
    async fn compute(&self, request: &ComputeRequest, _input: &InputFile) -> Reply {
        self.requests.lock().expect("requests").push(request.clone());
        let receiver = self.replies.lock().expect("replies").pop_front();
        match receiver {
            Some(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(TransportError::Request("gate dropped".to_string()))),
            None => Err(TransportError::Request("no scripted reply".to_string())),
        }
    }

    async fn template(&self) -> Reply {
        self.template_calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"template-bytes".to_vec())
    }
}

pub(super) fn form() -> ComputeForm {
    ComputeForm {
        start_date: "2025-01-01".to_string(),
        end_date: "2025-12-31".to_string(),
        min_proximity_days: "2".to_string(),
    }
}

pub(super) fn build_service() -> (Arc<ReviewService<GatedSolver>>, Arc<GatedSolver>) {
    let solver = Arc::new(GatedSolver::default());
    let service = Arc::new(ReviewService::new(solver.clone(), form()));
    (service, solver)
}

pub(super) fn router_with_service(service: Arc<ReviewService<GatedSolver>>) -> axum::Router {
    review_router(service, DEFAULT_MAX_UPLOAD_BYTES)
}

pub(super) fn router_with_upload_limit(
    service: Arc<ReviewService<GatedSolver>>,
    max_upload_bytes: usize,
) -> axum::Router {
    review_router(service, max_upload_bytes)
}

/// Input workbook with a `festivi-pesanti` sheet listing the given keys.
pub(super) fn input_workbook(heavy: &[(&str, &str)]) -> Vec<u8> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("festivi-pesanti").expect("sheet name");
    sheet.write_string(0, 0, "data").expect("header");
    sheet.write_string(0, 1, "turno").expect("header");
    for (index, (date, shift)) in heavy.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, *date).expect("date");
        sheet.write_string(row, 1, *shift).expect("shift");
    }

    let teams = workbook.add_worksheet();
    teams.set_name("squadre").expect("sheet name");
    teams.write_string(0, 0, "squadra").expect("header");

    workbook.save_to_buffer().expect("input workbook")
}

/// One assignment line: date, shift, weight, team.
pub(super) type Assignment<'a> = (&'a str, &'a str, f64, f64);

/// Result workbook with the assignment list, a weights summary and, when
/// given, an events summary with one row per team.
pub(super) fn result_workbook(assignments: &[Assignment<'_>], events: &[(f64, [f64; 12])]) -> Vec<u8> {
    let mut workbook = Workbook::new();

    let list = workbook.add_worksheet();
    list.set_name("lista-festivi").expect("sheet name");
    for (column, header) in ["data", "turno", "peso", "squadra assegnata"].iter().enumerate() {
        list.write_string(0, column as u16, *header).expect("header");
    }
    for (index, (date, shift, weight, team)) in assignments.iter().enumerate() {
        let row = index as u32 + 1;
        list.write_string(row, 0, *date).expect("date");
        list.write_string(row, 1, *shift).expect("shift");
        list.write_number(row, 2, *weight).expect("weight");
        list.write_number(row, 3, *team).expect("team");
    }

    let weights = workbook.add_worksheet();
    weights.set_name("riepilogo-pesi").expect("sheet name");
    weights.write_string(0, 0, "categoria").expect("header");
    weights.write_string(0, 1, "peso totale").expect("header");
    weights.write_string(1, 0, "pesanti").expect("cell");
    weights.write_number(1, 1, 6).expect("cell");

    if !events.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name("riepilogo-eventi").expect("sheet name");
        sheet.write_string(0, 0, "squadra").expect("header");
        for (index, label) in MONTH_LABELS.iter().enumerate() {
            sheet.write_string(0, index as u16 + 1, *label).expect("header");
        }
        for (index, (team, counts)) in events.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_number(row, 0, *team).expect("team");
            for (month, count) in counts.iter().enumerate() {
                sheet.write_number(row, month as u16 + 1, *count).expect("count");
            }
        }
    }

    workbook.save_to_buffer().expect("result workbook")
}

/// Events row with a single non-zero month.
pub(super) fn events_in(month: usize, count: f64) -> [f64; 12] {
    let mut counts = [0.0; 12];
    counts[month] = count;
    counts
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
