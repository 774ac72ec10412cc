use crate::effect::BulkAction;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SubmitClicked { submitted_at } => state.submit(&submitted_at),
        Msg::FocusToggled => {
            state.toggle_focus();
            Vec::new()
        }
        Msg::CursorUp => {
            state.move_cursor(false);
            Vec::new()
        }
        Msg::CursorDown => {
            state.move_cursor(true);
            Vec::new()
        }
        Msg::SelectionToggled => {
            state.toggle_selection();
            Vec::new()
        }
        Msg::RowActivated => state.activate_row(),
        Msg::PageNext => {
            state.turn_page(true);
            Vec::new()
        }
        Msg::PagePrev => {
            state.turn_page(false);
            Vec::new()
        }
        Msg::PageSizeCycled => {
            state.cycle_page_size();
            Vec::new()
        }
        Msg::RerunSelectedClicked => state.start_bulk(BulkAction::Recrawl),
        Msg::DeleteSelectedClicked => state.start_bulk(BulkAction::Delete),
        Msg::NavigateTo(path) => state.navigate(&path),
        Msg::BackClicked => state.navigate("/"),
        Msg::BannerDismissed => {
            state.dismiss_banner();
            Vec::new()
        }
        Msg::FetchSettled { token, result } => {
            state.apply_fetch(token, result);
            Vec::new()
        }
        Msg::SubmissionSettled {
            correlation,
            result,
        } => state.settle_submission(correlation, result),
        Msg::BulkSettled {
            batch,
            action,
            failures,
        } => state.settle_bulk(batch, action, failures),
        Msg::PollTick => state.poll(),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
