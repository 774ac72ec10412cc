use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dashboard_client::{EnvTokenProvider, ReqwestApi};
use dashboard_core::{update, AppState, AppViewModel, Focus, Msg, PageView};
use dashboard_logging::{dash_error, dash_info};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::config::{DashConfig, BASE_URL_ENV};
use super::effects::EffectRunner;
use super::{logging, ui, Args};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Input poll granularity; also bounds how long engine events wait.
const TICK: Duration = Duration::from_millis(75);

pub fn run_app(args: Args) -> anyhow::Result<()> {
    logging::initialize(args.log_to);

    let mut config = DashConfig::load(&args.config)?;
    config.override_base_url(std::env::var(BASE_URL_ENV).ok(), args.base_url.clone());
    dash_info!(
        "crawl-dash starting against {} (poll every {} ms)",
        config.api_base_url,
        config.poll_interval_ms
    );

    let api = ReqwestApi::new(config.api_settings(), Arc::new(EnvTokenProvider::default()))
        .context("invalid API settings")?;
    let runner = EffectRunner::new(Arc::new(api))?;
    let mut app = App::new(runner, &config);

    let mut terminal = enter_terminal()?;
    let result = app.run(&mut terminal, &args.route);
    if let Err(err) = &result {
        dash_error!("UI loop failed: {:#}", err);
    }
    leave_terminal(&mut terminal)?;
    result
}

fn enter_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let terminal = execute!(io::stdout(), EnterAlternateScreen)
        .context("failed to enter alternate screen")
        .and_then(|()| {
            Terminal::new(CrosstermBackend::new(io::stdout())).context("failed to create terminal")
        });
    match terminal {
        Ok(terminal) => {
            chain_panic_hook(restore_terminal);
            Ok(terminal)
        }
        Err(err) => {
            restore_terminal();
            Err(err)
        }
    }
}

/// Best-effort restore for paths that cannot report errors.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Runs `restore` ahead of the current panic hook so the report lands on a
/// usable screen.
fn chain_panic_hook(restore: fn()) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

fn leave_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to restore cursor")?;
    Ok(())
}

struct App {
    state: AppState,
    view: AppViewModel,
    runner: EffectRunner,
    poll_interval: Duration,
}

impl App {
    fn new(runner: EffectRunner, config: &DashConfig) -> Self {
        let state = AppState::new().with_page_size(config.page_size);
        let view = state.view();
        Self {
            state,
            view,
            runner,
            poll_interval: config.poll_interval(),
        }
    }

    fn run(&mut self, terminal: &mut Tui, route: &str) -> anyhow::Result<()> {
        self.dispatch(Msg::NavigateTo(route.to_string()));
        let mut last_poll = Instant::now();
        let mut needs_draw = true;

        loop {
            for msg in self.runner.drain() {
                self.dispatch(msg);
            }
            if last_poll.elapsed() >= self.poll_interval {
                self.dispatch(Msg::PollTick);
                last_poll = Instant::now();
            }

            if self.state.consume_dirty() || needs_draw {
                self.view = self.state.view();
                terminal.draw(|frame| ui::render::render(frame, &self.view))?;
                needs_draw = false;
            }

            if !event::poll(TICK)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match key_action(key, &self.view) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Dispatch(msg) => self.dispatch(msg),
                        KeyAction::Ignore => {}
                    }
                }
                Event::Resize(..) => needs_draw = true,
                _ => {}
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Dispatch(Msg),
    Ignore,
}

/// Translates a key press into a message for the page on screen.
fn key_action(key: KeyEvent, view: &AppViewModel) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    if key.code == KeyCode::Esc && view.banner.is_some() {
        return KeyAction::Dispatch(Msg::BannerDismissed);
    }

    let msg = match &view.page {
        PageView::List(list) if list.focus == Focus::Input => match key.code {
            KeyCode::Enter => Msg::SubmitClicked {
                submitted_at: Utc::now().to_rfc3339(),
            },
            KeyCode::Tab | KeyCode::Down => Msg::FocusToggled,
            KeyCode::Backspace => {
                let mut text = list.input.clone();
                text.pop();
                Msg::InputChanged(text)
            }
            KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                let mut text = list.input.clone();
                text.push(ch);
                Msg::InputChanged(text)
            }
            _ => return KeyAction::Ignore,
        },
        PageView::List(_) => match key.code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Tab | KeyCode::Char('/') => Msg::FocusToggled,
            KeyCode::Up | KeyCode::Char('k') => Msg::CursorUp,
            KeyCode::Down | KeyCode::Char('j') => Msg::CursorDown,
            KeyCode::Char(' ') => Msg::SelectionToggled,
            KeyCode::Enter => Msg::RowActivated,
            KeyCode::Right | KeyCode::Char('n') => Msg::PageNext,
            KeyCode::Left | KeyCode::Char('p') => Msg::PagePrev,
            KeyCode::Char('s') => Msg::PageSizeCycled,
            KeyCode::Char('r') => Msg::RerunSelectedClicked,
            KeyCode::Char('d') => Msg::DeleteSelectedClicked,
            _ => return KeyAction::Ignore,
        },
        PageView::Detail(_) => match key.code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => Msg::BackClicked,
            _ => return KeyAction::Ignore,
        },
        PageView::Blank => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            _ => return KeyAction::Ignore,
        },
    };
    KeyAction::Dispatch(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn list_view() -> AppViewModel {
        let (state, _) = update(AppState::new(), Msg::NavigateTo("/".to_string()));
        let (state, _) = update(state, Msg::InputChanged("https://a.ex".to_string()));
        state.view()
    }

    #[test]
    fn typing_edits_the_input() {
        let view = list_view();
        assert_eq!(
            key_action(press(KeyCode::Char('m')), &view),
            KeyAction::Dispatch(Msg::InputChanged("https://a.exm".to_string()))
        );
        assert_eq!(
            key_action(press(KeyCode::Backspace), &view),
            KeyAction::Dispatch(Msg::InputChanged("https://a.e".to_string()))
        );
        // q is text while the input has focus.
        assert_ne!(key_action(press(KeyCode::Char('q')), &view), KeyAction::Quit);
    }

    #[test]
    fn enter_in_the_input_submits_with_a_timestamp() {
        let view = list_view();
        match key_action(press(KeyCode::Enter), &view) {
            KeyAction::Dispatch(Msg::SubmitClicked { submitted_at }) => {
                assert!(chrono::DateTime::parse_from_rfc3339(&submitted_at).is_ok());
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn table_keys_drive_cursor_selection_and_bulk_actions() {
        let (state, _) = update(AppState::new(), Msg::NavigateTo("/".to_string()));
        let (state, _) = update(state, Msg::FocusToggled);
        let view = state.view();

        assert_eq!(
            key_action(press(KeyCode::Down), &view),
            KeyAction::Dispatch(Msg::CursorDown)
        );
        assert_eq!(
            key_action(press(KeyCode::Char(' ')), &view),
            KeyAction::Dispatch(Msg::SelectionToggled)
        );
        assert_eq!(
            key_action(press(KeyCode::Char('d')), &view),
            KeyAction::Dispatch(Msg::DeleteSelectedClicked)
        );
        assert_eq!(key_action(press(KeyCode::Char('q')), &view), KeyAction::Quit);
    }

    #[test]
    fn escape_dismisses_banner_before_going_back() {
        let (state, _) = update(AppState::new(), Msg::NavigateTo("/detail/4".to_string()));
        let mut view = state.view();
        assert_eq!(
            key_action(press(KeyCode::Esc), &view),
            KeyAction::Dispatch(Msg::BackClicked)
        );

        view.banner = Some("Delete failed".to_string());
        assert_eq!(
            key_action(press(KeyCode::Esc), &view),
            KeyAction::Dispatch(Msg::BannerDismissed)
        );
    }

    #[test]
    fn ctrl_c_always_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_action(key, &list_view()), KeyAction::Quit);
    }

    #[test]
    fn panic_hook_restores_before_reporting() {
        use std::sync::atomic::{AtomicBool, Ordering};

        static RESTORED: AtomicBool = AtomicBool::new(false);
        fn mark_restored() {
            RESTORED.store(true, Ordering::SeqCst);
        }

        chain_panic_hook(mark_restored);
        let outcome = panic::catch_unwind(|| panic!("render failed"));
        drop(panic::take_hook());

        assert!(outcome.is_err());
        assert!(RESTORED.load(Ordering::SeqCst));
    }
}
