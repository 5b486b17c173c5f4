// src/app.rs

use crate::core::config::AuditConfig;
use crate::core::models::{
    AnalysisFinding, AuditEvent, AuditPhase, AuditUpdate, DomainSnapshot, IpInfo, LogEvent,
    MtaStsReport, ObservatoryReport, PreloadStatus, RdapSummary, SecurityTxtFile, Severity,
    SideChannelUpdate,
};

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub enum AppState {
    Idle,
    Auditing,
    Finished,
}

/// Everything the side channels have reported so far. Each field flips from
/// `None` to `Some` independently as lookups settle; a field that stays
/// `None` after completion renders as "unavailable".
#[derive(Debug, Default)]
pub struct SideChannels {
    pub rdap: Option<RdapSummary>,
    pub hsts_preload: Option<PreloadStatus>,
    pub observatory: Option<ObservatoryReport>,
    pub mta_sts: Option<MtaStsReport>,
    pub tls_rpt: Option<String>,
    pub security_txt: Option<SecurityTxtFile>,
    pub ip_info: Option<IpInfo>,
}

#[derive(Debug, Default)]
pub struct AuditSummary {
    pub score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub dns_check_passed: bool,
    pub mail_check_passed: bool,
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub config: AuditConfig,
    /// Monotonic audit counter; updates from earlier audits carry a smaller
    /// generation and are discarded.
    pub generation: u64,
    pub phase: AuditPhase,
    pub snapshot: Option<DomainSnapshot>,
    pub findings: Vec<AnalysisFinding>,
    pub side_channels: SideChannels,
    pub log: Vec<LogEvent>,
    pub summary: AuditSummary,
    pub show_logs: bool,
    pub selected_finding: usize,
    pub spinner_frame: usize,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            state: AppState::Idle,
            input: String::new(),
            config: AuditConfig::from_env(),
            generation: 0,
            phase: AuditPhase::NotStarted,
            snapshot: None,
            findings: Vec::new(),
            side_channels: SideChannels::default(),
            log: Vec::new(),
            summary: AuditSummary::default(),
            show_logs: true,
            selected_finding: 0,
            spinner_frame: 0,
        }
    }

    /// Fold one update from the audit task into the view state. Updates
    /// tagged with a stale generation belong to an abandoned audit and are
    /// ignored wholesale.
    pub fn apply_update(&mut self, update: AuditUpdate) {
        if update.generation != self.generation {
            return;
        }
        match update.event {
            AuditEvent::Phase(phase) => {
                self.phase = phase;
                if phase == AuditPhase::Complete {
                    self.state = AppState::Finished;
                    self.update_summary();
                }
            }
            AuditEvent::Log(event) => self.log.push(event),
            AuditEvent::Dns(snapshot) => self.snapshot = Some(snapshot),
            AuditEvent::Findings(findings) => {
                self.findings = findings;
                self.selected_finding = 0;
            }
            AuditEvent::SideChannel(sc) => match sc {
                SideChannelUpdate::Rdap(v) => self.side_channels.rdap = v,
                SideChannelUpdate::HstsPreload(v) => self.side_channels.hsts_preload = v,
                SideChannelUpdate::Observatory(v) => self.side_channels.observatory = v,
                SideChannelUpdate::MtaSts(v) => self.side_channels.mta_sts = v,
                SideChannelUpdate::TlsRpt(v) => self.side_channels.tls_rpt = v,
                SideChannelUpdate::SecurityTxt(v) => self.side_channels.security_txt = v,
                SideChannelUpdate::IpInfo(v) => self.side_channels.ip_info = v,
            },
        }
    }

    pub fn update_summary(&mut self) {
        let criticals = self
            .findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::Critical))
            .count();
        let warnings = self
            .findings
            .iter()
            .filter(|f| matches!(f.severity, Severity::Warning))
            .count();

        let score = 100_i16
            .saturating_sub((criticals * 15) as i16)
            .saturating_sub((warnings * 5) as i16);

        let dns_check_passed = !self.findings.iter().any(|f| f.code.starts_with("DNS_"));
        let mail_check_passed = !self.findings.iter().any(|f| f.code.starts_with("MAIL_"));

        self.summary = AuditSummary {
            score: score.max(0) as u8,
            critical_issues: criticals,
            warning_issues: warnings,
            dns_check_passed,
            mail_check_passed,
        };
    }

    pub fn select_next_finding(&mut self) {
        if !self.findings.is_empty() {
            self.selected_finding = (self.selected_finding + 1) % self.findings.len();
        }
    }

    pub fn select_previous_finding(&mut self) {
        if !self.findings.is_empty() {
            self.selected_finding =
                (self.selected_finding + self.findings.len() - 1) % self.findings.len();
        }
    }

    pub fn on_tick(&mut self) {
        if matches!(self.state, AppState::Auditing) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Clear the board for a new audit. The generation is bumped by the
    /// caller when it actually starts one.
    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.phase = AuditPhase::NotStarted;
        self.snapshot = None;
        self.findings = Vec::new();
        self.side_channels = SideChannels::default();
        self.log = Vec::new();
        self.summary = AuditSummary::default();
        self.selected_finding = 0;
    }
}
