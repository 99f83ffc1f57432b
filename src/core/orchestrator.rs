//! 生成编排器：主控循环
//!
//! 负责：加载配置、创建生成客户端与渲染适配器、建立 cmd/state/transition 三通道，
//! 并在后台任务中消费命令（Navigate/Initialize/Regenerate/Unmount/Quit）与内部事件，
//! 驱动 RetryMachine 并更新展示状态。
//!
//! 所有可变状态（重试预算、请求闸门、定时器句柄）只由这个任务修改。每个在途操作都带着
//! (cycle, op) 标记回报结果，与当前值不符的回报直接丢弃。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog;
use crate::config::AppConfig;
use crate::core::{
    CycleId, CycleState, Effect, Fingerprint, GenerationError, OrchestratorView, RequestGate,
    RetryMachine, RouteParams, Transition, REGENERATING_NOTICE,
};
use crate::generation::{create_client_from_config, GenerationClient, GenerationResult};
use crate::sandbox::{
    CapabilityScope, CommandSandbox, NullSandbox, RenderAdapter, RenderOutcome, RenderSandbox,
};

/// 从展示层发往编排器的命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 路由变化：重新解析 fingerprint；变化则丢弃旧周期，随后尝试初始化
    Navigate(RouteParams),
    /// 初始化（可能被宿主重复调用，请求闸门保证只生效一次）
    Initialize,
    /// 手动重新生成：清空预算、作废定时器，立即发起新请求
    Regenerate,
    /// 卸载：回到 Idle，丢弃所有周期数据
    Unmount,
    /// 退出编排器任务
    Quit,
}

/// 编排器参数
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(2000),
        }
    }
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            max_retries: cfg.retry.max_retries,
            retry_delay: cfg.retry.delay(),
        }
    }
}

/// 在途操作回报的事件
#[derive(Debug)]
enum EventKind {
    Generated(Result<GenerationResult, GenerationError>),
    Rendered(RenderOutcome),
    RetryDue,
}

#[derive(Debug)]
struct Event {
    cycle: CycleId,
    op: u64,
    kind: EventKind,
}

/// 展示层持有的句柄：发送命令、观察状态与迁移
#[derive(Clone)]
pub struct OrchestratorHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<OrchestratorView>,
    transitions_tx: broadcast::Sender<Transition>,
}

impl OrchestratorHandle {
    /// 发送命令；编排器已退出时返回 false
    pub fn send(&self, cmd: Command) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    pub fn navigate(&self, params: RouteParams) -> bool {
        self.send(Command::Navigate(params))
    }

    pub fn initialize(&self) -> bool {
        self.send(Command::Initialize)
    }

    pub fn regenerate(&self) -> bool {
        self.send(Command::Regenerate)
    }

    pub fn unmount(&self) -> bool {
        self.send(Command::Unmount)
    }

    pub fn quit(&self) -> bool {
        self.send(Command::Quit)
    }

    /// 当前状态快照
    pub fn view(&self) -> OrchestratorView {
        self.state_rx.borrow().clone()
    }

    pub fn state(&self) -> watch::Receiver<OrchestratorView> {
        self.state_rx.clone()
    }

    pub fn subscribe_transitions(&self) -> broadcast::Receiver<Transition> {
        self.transitions_tx.subscribe()
    }

    /// 等待直到状态满足条件；编排器已退出时返回最后一次快照
    pub async fn wait_until(&self, pred: impl Fn(&OrchestratorView) -> bool) -> OrchestratorView {
        let mut rx = self.state_rx.clone();
        if let Ok(v) = rx.wait_for(|v| pred(v)).await {
            return v.clone();
        }
        let last = rx.borrow().clone();
        last
    }
}

pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    adapter: RenderAdapter,
    retry_delay: Duration,

    machine: RetryMachine,
    gate: RequestGate,
    fingerprint: Option<Fingerprint>,
    cycle: CycleId,
    /// 当前在途操作编号；None 表示没有在等任何回报
    pending_op: Option<u64>,
    next_op: u64,
    result: Option<GenerationResult>,
    error: Option<GenerationError>,

    /// 会话级 token；每个周期使用它的子 token
    session_token: CancellationToken,
    cycle_token: CancellationToken,
    timer: Option<JoinHandle<()>>,

    events_tx: mpsc::UnboundedSender<Event>,
    state_tx: watch::Sender<OrchestratorView>,
    transitions_tx: broadcast::Sender<Transition>,
}

/// 创建编排器任务并返回句柄
pub fn spawn_orchestrator(
    client: Arc<dyn GenerationClient>,
    adapter: RenderAdapter,
    settings: OrchestratorSettings,
) -> OrchestratorHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (events_tx, events_rx) = mpsc::unbounded_channel::<Event>();
    let machine = RetryMachine::new(settings.max_retries);
    let (state_tx, state_rx) = watch::channel(OrchestratorView {
        max_retries: machine.max_retries(),
        ..OrchestratorView::default()
    });
    let (transitions_tx, _) = broadcast::channel::<Transition>(64);

    let session_token = CancellationToken::new();
    let orchestrator = Orchestrator {
        client,
        adapter,
        retry_delay: settings.retry_delay,
        machine,
        gate: RequestGate::new(),
        fingerprint: None,
        cycle: 0,
        pending_op: None,
        next_op: 0,
        result: None,
        error: None,
        cycle_token: session_token.child_token(),
        session_token,
        timer: None,
        events_tx,
        state_tx,
        transitions_tx: transitions_tx.clone(),
    };

    tokio::spawn(orchestrator.run(cmd_rx, events_rx));

    OrchestratorHandle {
        cmd_tx,
        state_rx,
        transitions_tx,
    }
}

/// 根据配置选择渲染沙箱（外部命令 / Null）
pub(crate) fn create_sandbox_from_config(cfg: &AppConfig) -> Arc<dyn RenderSandbox> {
    match cfg.sandbox.command.as_deref() {
        Some(program) if !program.trim().is_empty() => {
            tracing::info!("Using command sandbox ({})", program);
            Arc::new(CommandSandbox::new(
                program,
                cfg.sandbox.args.clone(),
                cfg.sandbox.timeout_secs,
            ))
        }
        _ => {
            tracing::warn!("No sandbox command configured, every render is treated as successful");
            Arc::new(NullSandbox)
        }
    }
}

/// 从配置创建生成客户端、渲染适配器并启动编排器
pub fn create_orchestrator_with_config(cfg: &AppConfig) -> OrchestratorHandle {
    let client = create_client_from_config(cfg);
    let adapter = RenderAdapter::new(
        create_sandbox_from_config(cfg),
        CapabilityScope::default(),
        cfg.sandbox.settle(),
    );
    spawn_orchestrator(client, adapter, OrchestratorSettings::from(cfg))
}

impl Orchestrator {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut events_rx: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Quit) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(event) = events_rx.recv() => self.handle_event(event),
            }
        }
        self.cancel_inflight();
        self.session_token.cancel();
        tracing::debug!("orchestrator stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Navigate(params) => {
                let fingerprint = match params.resolve() {
                    Ok(fp) => Some(fp),
                    Err(e) => {
                        tracing::debug!(error = %e, ?params, "Route unresolved, staying idle");
                        None
                    }
                };
                if fingerprint != self.fingerprint {
                    self.discard_cycle();
                    self.fingerprint = fingerprint;
                    self.publish();
                }
                self.initialize();
            }
            Command::Initialize => self.initialize(),
            Command::Regenerate => self.regenerate(),
            Command::Unmount => {
                self.discard_cycle();
                self.fingerprint = None;
                self.publish();
            }
            Command::Quit => {}
        }
    }

    fn initialize(&mut self) {
        let Some(fingerprint) = self.fingerprint else {
            tracing::debug!("No valid fingerprint, staying idle");
            return;
        };
        if !self.gate.try_start(fingerprint) {
            tracing::debug!(%fingerprint, "Duplicate initialization ignored");
            return;
        }
        self.begin_cycle(fingerprint);
    }

    fn regenerate(&mut self) {
        let Some(fingerprint) = self.fingerprint else {
            tracing::debug!("Regenerate without fingerprint ignored");
            return;
        };
        tracing::info!(%fingerprint, budget = self.machine.budget(), "Manual regenerate");
        self.gate.reset();
        self.gate.try_start(fingerprint);
        self.begin_cycle(fingerprint);
    }

    /// 丢弃当前周期并回到 Idle（fingerprint 变化 / 卸载）
    fn discard_cycle(&mut self) {
        self.cancel_inflight();
        self.gate.reset();
        let from = self.machine.state();
        self.machine.reset();
        self.result = None;
        self.error = None;
        if from != CycleState::Idle {
            self.emit(from);
        }
    }

    /// 作废定时器与在途操作；之后到达的回报都会因 op 不匹配而被丢弃
    fn cancel_inflight(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.cycle_token.cancel();
        self.cycle_token = self.session_token.child_token();
        self.pending_op = None;
    }

    fn begin_cycle(&mut self, fingerprint: Fingerprint) {
        self.cancel_inflight();
        self.cycle += 1;
        self.result = None;
        self.error = None;
        let from = self.machine.state();
        let effect = self.machine.start();
        tracing::info!(cycle = self.cycle, %fingerprint, "Generation cycle started");
        self.emit(from);
        self.apply(effect);
    }

    fn handle_event(&mut self, event: Event) {
        if event.cycle != self.cycle || Some(event.op) != self.pending_op {
            tracing::debug!(
                cycle = event.cycle,
                op = event.op,
                current = self.cycle,
                "Discarding stale completion"
            );
            return;
        }
        self.pending_op = None;

        let from = self.machine.state();
        let effect = match event.kind {
            EventKind::Generated(Ok(result)) => {
                let effect = self.machine.generation_succeeded();
                if effect.is_some() {
                    self.result = Some(result);
                }
                effect
            }
            EventKind::Generated(Err(err)) => self.machine.generation_failed(err),
            EventKind::Rendered(outcome) => self.machine.render_finished(outcome),
            EventKind::RetryDue => {
                self.timer = None;
                self.machine.retry_due()
            }
        };
        let Some(effect) = effect else {
            return;
        };
        self.emit(from);
        self.apply(effect);
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Generate => self.spawn_generate(),
            Effect::Render => self.spawn_render(),
            Effect::ScheduleRetry { attempt } => {
                tracing::warn!(
                    cycle = self.cycle,
                    attempt,
                    max = self.machine.max_retries(),
                    "Render failed, regenerating in {:?}",
                    self.retry_delay
                );
                self.arm_retry_timer();
            }
            Effect::Complete => {
                tracing::info!(cycle = self.cycle, "Component rendered");
            }
            Effect::Abort(err) => {
                tracing::error!(cycle = self.cycle, error = %err, "Generation cycle failed");
                self.result = None;
                self.error = Some(err);
            }
        }
        self.publish();
    }

    fn next_op(&mut self) -> u64 {
        self.next_op += 1;
        self.pending_op = Some(self.next_op);
        self.next_op
    }

    fn spawn_generate(&mut self) {
        let Some(fingerprint) = self.fingerprint else {
            return;
        };
        let op = self.next_op();
        let cycle = self.cycle;
        let client = self.client.clone();
        let token = self.cycle_token.clone();
        let tx = self.events_tx.clone();
        tracing::debug!(cycle, op, backend = client.name(), "Requesting generation");
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = client.generate(&fingerprint) => {
                    let _ = tx.send(Event { cycle, op, kind: EventKind::Generated(result) });
                }
            }
        });
    }

    fn spawn_render(&mut self) {
        let Some(source) = self.result.as_ref().map(|r| r.source_text.clone()) else {
            return;
        };
        let op = self.next_op();
        let cycle = self.cycle;
        let adapter = self.adapter.clone();
        let token = self.cycle_token.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                outcome = adapter.present(&source) => {
                    let _ = tx.send(Event { cycle, op, kind: EventKind::Rendered(outcome) });
                }
            }
        });
    }

    fn arm_retry_timer(&mut self) {
        let op = self.next_op();
        let cycle = self.cycle;
        let delay = self.retry_delay;
        let token = self.cycle_token.clone();
        let tx = self.events_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(Event { cycle, op, kind: EventKind::RetryDue });
                }
            }
        }));
    }

    fn emit(&self, from: CycleState) {
        let _ = self.transitions_tx.send(Transition {
            cycle: self.cycle,
            from,
            to: self.machine.state(),
        });
    }

    /// 将内部状态投影为 OrchestratorView 并发布
    fn publish(&self) {
        let phase = self.machine.state();
        let succeeded = phase == CycleState::Succeeded;
        let failed = phase == CycleState::Failed;
        let auto_retrying = self.machine.is_auto_retrying();
        let view = OrchestratorView {
            phase,
            cycle: self.cycle,
            fingerprint: self.fingerprint,
            persona_label: self
                .fingerprint
                .and_then(|fp| catalog::persona(fp.persona_id))
                .map(|p| p.label),
            style_label: self
                .fingerprint
                .and_then(|fp| catalog::designer(fp.designer_id))
                .map(|d| d.label),
            result: self.result.clone().filter(|_| succeeded),
            source: self
                .result
                .as_ref()
                .filter(|_| succeeded)
                .map(|r| r.normalized_source()),
            error: self.error.clone().filter(|_| failed),
            error_message: self
                .error
                .as_ref()
                .filter(|_| failed)
                .map(|e| e.message().to_string()),
            notice: auto_retrying.then_some(REGENERATING_NOTICE),
            is_auto_retrying: auto_retrying,
            retry_budget: self.machine.budget(),
            max_retries: self.machine.max_retries(),
        };
        self.state_tx.send_replace(view);
    }
}
