use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Dashboard data that can be refetched from the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTarget {
    Notifications,
    Deposits,
    DepositOverview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    NewDeposit,
    DepositVerified,
}

/// Transient user-facing alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// Side effect requested by the session binder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    Refresh(RefreshTarget),
    Alert(Alert),
}

/// Sending half of the dashboard command channel
#[derive(Debug, Clone)]
pub struct DashboardSink {
    tx: Sender<DashboardCommand>,
}

impl DashboardSink {
    /// Create a sink and the receiver the UI drains
    pub fn channel() -> (Self, Receiver<DashboardCommand>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    pub fn refresh(&self, target: RefreshTarget) {
        self.send(DashboardCommand::Refresh(target));
    }

    pub fn alert(&self, kind: AlertKind, message: impl Into<String>) {
        self.send(DashboardCommand::Alert(Alert {
            kind,
            message: message.into(),
        }));
    }

    fn send(&self, command: DashboardCommand) {
        if self.tx.send(command).is_err() {
            debug!("Dashboard receiver dropped, discarding command");
        }
    }
}
