use super::types::{CompareDone, CompareJob};
use super::App;
use log::{info, warn};
use pagediff_core::compare::save_report;
use pagediff_core::CompareStatus;
use std::sync::{mpsc, Arc};
use std::thread;

impl App {
    /// Send both documents to the compare backend. Earlier results are cleared
    /// right away.
    pub fn start_compare(&mut self) {
        let request = match self.session.begin_compare() {
            Ok(request) => request,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };
        self.reset_catalog_cursor();
        self.ensure_compare_worker();

        let job = CompareJob {
            ticket: request.ticket,
            a: request.a,
            b: request.b,
        };
        let sent = self
            .compare_tx
            .as_ref()
            .is_some_and(|tx| tx.send(job).is_ok());
        if sent {
            self.set_status(format!("Comparing via {}...", self.backend.describe()));
        } else {
            warn!("compare worker is gone");
            self.compare_tx = None;
            self.compare_rx = None;
            self.set_error("Compare worker stopped; try again");
        }
    }

    fn ensure_compare_worker(&mut self) {
        if self.compare_tx.is_some() && self.compare_rx.is_some() {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let (req_tx, req_rx) = mpsc::channel::<CompareJob>();
        let (resp_tx, resp_rx) = mpsc::channel::<CompareDone>();
        thread::spawn(move || {
            while let Ok(job) = req_rx.recv() {
                let result = backend.compare(&job.a, &job.b);
                if resp_tx
                    .send(CompareDone {
                        ticket: job.ticket,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });
        self.compare_tx = Some(req_tx);
        self.compare_rx = Some(resp_rx);
    }

    /// Apply finished compares. Returns true when the session changed.
    pub(super) fn poll_compare(&mut self) -> bool {
        let Some(rx) = self.compare_rx.as_ref() else {
            return false;
        };
        let mut finished = Vec::new();
        while let Ok(done) = rx.try_recv() {
            finished.push(done);
        }

        let mut changed = false;
        for done in finished {
            let response = match &self.save_report {
                Some(_) => done.result.as_ref().ok().cloned(),
                None => None,
            };
            if !self.session.finish_compare(done.ticket, done.result) {
                continue;
            }
            changed = true;
            match self.session.status().clone() {
                CompareStatus::Done => {
                    let count = self.session.catalog().len();
                    self.reset_catalog_cursor();
                    self.set_status(match count {
                        0 => "No differences found".to_string(),
                        1 => "1 difference".to_string(),
                        n => format!("{n} differences"),
                    });
                    if let (Some(path), Some(response)) = (self.save_report.clone(), response) {
                        match save_report(&path, &response) {
                            Ok(()) => info!("saved report to {}", path.display()),
                            Err(e) => self.set_error(format!("Could not save report: {e}")),
                        }
                    }
                }
                CompareStatus::Failed(reason) => {
                    self.set_error(format!("Comparison failed: {reason}"));
                }
                _ => {}
            }
        }
        changed
    }

    pub fn is_comparing(&self) -> bool {
        matches!(self.session.status(), CompareStatus::Running(_))
    }
}
