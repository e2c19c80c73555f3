mod ui;
mod widgets;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::adaptation::{AdaptationEngine, Notification};
use crate::models::{Difficulty, Plan, Profile, StudySession, Subject};
use crate::orchestrator::PlanOrchestrator;
use crate::presenter::Presenter;
use crate::state::{self, BehaviorEvent, SharedStore, SubjectField, MIN_SUBJECTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Timeline,
    Subjects,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Timeline,
            View::Timeline => View::Subjects,
            View::Subjects => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Subjects,
            View::Timeline => View::Dashboard,
            View::Subjects => View::Timeline,
        }
    }
}

/// Presenter signals, delivered to the UI loop
#[derive(Debug, Clone)]
pub enum UiEvent {
    Computing,
    Cleared,
    Rendered(Plan),
    Failed(String),
    Notified(Notification),
    Rejected(String),
}

/// Deliver to the UI loop; after it has exited there is nobody to tell
fn send_event(tx: &UnboundedSender<UiEvent>, event: UiEvent) -> bool {
    if tx.send(event).is_err() {
        debug!("send_event: UI closed, dropping event");
        return false;
    }
    true
}

pub struct ChannelPresenter {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelPresenter {
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UiEvent) {
        send_event(&self.tx, event);
    }
}

impl Presenter for ChannelPresenter {
    fn show_computing(&self) {
        self.send(UiEvent::Computing);
    }

    fn clear_computing(&self) {
        self.send(UiEvent::Cleared);
    }

    fn render(&self, plan: &Plan) {
        self.send(UiEvent::Rendered(plan.clone()));
    }

    fn failure(&self, message: &str) {
        self.send(UiEvent::Failed(message.to_string()));
    }

    fn notify(&self, notification: &Notification) {
        self.send(UiEvent::Notified(notification.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Alert(String),
    Error(String),
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    /// Swap in new items, keeping the cursor in range
    fn replace(&mut self, items: Vec<T>) {
        self.selected = match (self.selected, items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.items = items;
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    store: SharedStore,
    orchestrator: Arc<PlanOrchestrator>,
    adaptation: Arc<AdaptationEngine>,
    events: UnboundedSender<UiEvent>,
    pub view: View,
    pub profile: Profile,
    pub subjects: StatefulList<Subject>,
    pub timeline: StatefulList<StudySession>,
    pub plan: Option<Plan>,
    pub computing: bool,
    pub status: Option<Status>,
    pub input_mode: bool,
    pub input: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        store: SharedStore,
        orchestrator: Arc<PlanOrchestrator>,
        adaptation: Arc<AdaptationEngine>,
        events: UnboundedSender<UiEvent>,
    ) -> Self {
        let (profile, subjects, plan) = {
            let session = state::lock(&store);
            (
                session.profile().clone(),
                session.subjects().to_vec(),
                session.plan().cloned(),
            )
        };
        let timeline = plan.as_ref().map(|p| p.timeline().to_vec()).unwrap_or_default();

        Self {
            store,
            orchestrator,
            adaptation,
            events,
            view: View::Dashboard,
            profile,
            subjects: StatefulList::with_items(subjects),
            timeline: StatefulList::with_items(timeline),
            plan,
            computing: false,
            status: Some(Status::Info("Press r to generate your study plan".to_string())),
            input_mode: false,
            input: String::new(),
            should_quit: false,
        }
    }

    /// Pull profile and subjects from the session; adaptations change them
    /// from background tasks.
    pub fn refresh_data(&mut self) {
        let session = state::lock(&self.store);
        self.profile = session.profile().clone();
        self.subjects.replace(session.subjects().to_vec());
    }

    pub fn apply(&mut self, event: UiEvent) {
        debug!(?event, "App::apply");
        match event {
            UiEvent::Computing => {
                self.computing = true;
                if !matches!(self.status, Some(Status::Alert(_))) {
                    self.status = Some(Status::Info("Computing study plan...".to_string()));
                }
            }
            UiEvent::Cleared => self.computing = false,
            UiEvent::Rendered(plan) => {
                self.timeline.replace(plan.timeline().to_vec());
                self.plan = Some(plan);
                if !matches!(self.status, Some(Status::Alert(_))) {
                    self.status = Some(Status::Info("Plan updated".to_string()));
                }
            }
            UiEvent::Failed(message) => {
                self.status = Some(Status::Error(format!("Error generating schedule: {}", message)));
            }
            UiEvent::Notified(notification) => {
                self.status = Some(Status::Alert(format!(
                    "{}: {}",
                    notification.title, notification.message
                )));
            }
            UiEvent::Rejected(message) => self.status = Some(Status::Error(message)),
        }
    }

    fn spawn_plan(&self) {
        let orchestrator = self.orchestrator.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.request_plan().await {
                // Transport failures already reached the presenter
                if !e.is_transport() {
                    send_event(&events, UiEvent::Rejected(e.to_string()));
                }
            }
        });
    }

    fn spawn_adaptation(&mut self, event: BehaviorEvent) {
        let adaptation = self.adaptation.clone();
        let events = self.events.clone();
        if !matches!(self.status, Some(Status::Error(_))) {
            self.status = None;
        }
        tokio::spawn(async move {
            match adaptation.trigger(event).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    send_event(
                        &events,
                        UiEvent::Rejected("Generate a plan before simulating behavior".to_string()),
                    );
                }
                Err(e) if !e.is_transport() => {
                    send_event(&events, UiEvent::Rejected(e.to_string()));
                }
                Err(_) => {}
            }
        });
    }

    fn add_subject(&mut self) {
        let result = state::lock(&self.store)
            .add_subject(&self.input)
            .map(|s| s.name.clone());
        match result {
            Ok(name) => self.status = Some(Status::Info(format!("Added subject '{}'", name))),
            Err(e) => self.status = Some(Status::Error(e.to_string())),
        }
        self.input.clear();
        self.refresh_data();
        if self.status.as_ref().is_some_and(|s| matches!(s, Status::Info(_))) {
            self.subjects.selected = Some(self.subjects.items.len() - 1);
        }
    }

    fn remove_selected_subject(&mut self) {
        let Some(subject) = self.subjects.selected_item().cloned() else {
            return;
        };
        if self.subjects.items.len() <= MIN_SUBJECTS {
            self.status = Some(Status::Error("At least one subject is required".to_string()));
            return;
        }
        if state::lock(&self.store).remove_subject(&subject.id) {
            self.status = Some(Status::Info(format!("Removed subject '{}'", subject.name)));
        }
        self.refresh_data();
    }

    fn edit_selected_subject(&mut self, field: SubjectField, value: String) {
        let Some(id) = self.subjects.selected_item().map(|s| s.id.clone()) else {
            return;
        };
        if let Err(e) = state::lock(&self.store).update_subject(&id, field, &value) {
            self.status = Some(Status::Error(e.to_string()));
        }
        self.refresh_data();
    }

    fn cycle_difficulty(&mut self) {
        let next = self
            .subjects
            .selected_item()
            .map(|s| s.difficulty.cycle())
            .unwrap_or(Difficulty::Medium);
        self.edit_selected_subject(SubjectField::Difficulty, next.as_str().to_string());
    }

    fn adjust_confidence(&mut self, delta: i8) {
        let Some(current) = self.subjects.selected_item().map(|s| s.confidence.unwrap_or(3)) else {
            return;
        };
        let next = (current as i8 + delta).clamp(1, 5);
        self.edit_selected_subject(SubjectField::Confidence, next.to_string());
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if self.input_mode {
            match key {
                KeyCode::Esc => {
                    self.input_mode = false;
                    self.input.clear();
                }
                KeyCode::Enter => {
                    self.input_mode = false;
                    self.add_subject();
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }

            KeyCode::Char('r') => self.spawn_plan(),
            KeyCode::Char('1') => self.spawn_adaptation(BehaviorEvent::MissedSession),
            KeyCode::Char('2') => self.spawn_adaptation(BehaviorEvent::AcedTopic),
            KeyCode::Char('3') => self.spawn_adaptation(BehaviorEvent::Distraction),

            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.view = self.view.next(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Timeline => self.timeline.next(),
                View::Subjects => self.subjects.next(),
                View::Dashboard => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Timeline => self.timeline.previous(),
                View::Subjects => self.subjects.previous(),
                View::Dashboard => {}
            },

            KeyCode::Char('a') if self.view == View::Subjects => {
                self.input_mode = true;
                self.input.clear();
            }
            KeyCode::Char('x') if self.view == View::Subjects => self.remove_selected_subject(),
            KeyCode::Char('d') if self.view == View::Subjects => self.cycle_difficulty(),
            KeyCode::Char('+') | KeyCode::Char('=') if self.view == View::Subjects => {
                self.adjust_confidence(1)
            }
            KeyCode::Char('-') if self.view == View::Subjects => self.adjust_confidence(-1),

            KeyCode::Esc => self.status = None,
            _ => {}
        }
    }
}

pub fn run(
    store: SharedStore,
    orchestrator: Arc<PlanOrchestrator>,
    adaptation: Arc<AdaptationEngine>,
    events: UnboundedSender<UiEvent>,
    mut rx: UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, orchestrator, adaptation, events);

    let result = run_app(&mut terminal, &mut app, &mut rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

pub fn channel() -> (UnboundedSender<UiEvent>, UnboundedReceiver<UiEvent>) {
    mpsc::unbounded_channel()
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(event) = rx.try_recv() {
            app.apply(event);
        }
        app.refresh_data();

        terminal.draw(|f| ui::draw(f, app))?;

        // Blocking poll; plan requests run on other runtime workers
        if tokio::task::block_in_place(|| event::poll(Duration::from_millis(100)))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
