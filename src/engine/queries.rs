//! Stateless read commands and week administration
//!
//! Each command independently re-reads the store (or the week cache)
//! and formats a reply; none of them creates a session.

use super::{Engine, Replies};
use crate::store::Store;
use crate::transport::{ButtonChoice, Keyboard, Outgoing, Payload, UserRef};

impl<S: Store> Engine<S> {
    pub(super) async fn show_week(&self) -> Replies {
        let week = self.week.current(&self.store).await?;
        Ok(vec![Outgoing::text(format!("Current league week: {week}"))])
    }

    pub(super) async fn show_matches(&self) -> Replies {
        let week = self.week.current(&self.store).await?;
        let matches = self.store.matches_for_week(week).await?;
        if matches.is_empty() {
            return Ok(vec![Outgoing::text(format!(
                "No matches recorded for week {week}."
            ))]);
        }

        let mut lines = vec![format!("Matches of week {week}:")];
        for m in &matches {
            let status = match &m.result {
                Some(result) => format!("result: {result}"),
                None => "pending".to_string(),
            };
            lines.push(format!("#{}: {} vs {} ({status})", m.id, m.home_team, m.away_team));
        }
        Ok(vec![Outgoing::text(lines.join("\n"))])
    }

    /// `/mybets [week]`. Without an argument the listing covers the
    /// current week; a non-numeric argument falls back to all weeks.
    pub(super) async fn show_my_predictions(&self, user: &UserRef, arg: Option<&str>) -> Replies {
        let current = self.week.current(&self.store).await?;
        let week_filter = match arg {
            Some(raw) => raw.trim().parse::<u32>().ok(),
            None => Some(current),
        };

        let predictions = self.store.predictions_for_user(user.id, week_filter).await?;
        if predictions.is_empty() {
            let text = match week_filter {
                Some(week) => format!("No predictions recorded for week {week} yet."),
                None => "You have no predictions yet. Send /start to begin.".to_string(),
            };
            return Ok(vec![Outgoing::text(text)]);
        }

        let current_locked = self.store.is_week_locked(current).await?;
        let title = match week_filter {
            Some(week) => format!("Your predictions for week {week}:"),
            None => "All your predictions:".to_string(),
        };

        let mut replies = vec![Outgoing::text(title)];
        for p in &predictions {
            let status = match (&p.result, p.points) {
                (Some(_), Some(points)) => format!(" (scored: {points} point(s))"),
                (Some(_), None) => " (awaiting scoring)".to_string(),
                (None, _) => String::new(),
            };
            let text = format!(
                "{} vs {}\nScore: {}\nWinner: {}{status}",
                p.home_team, p.away_team, p.score, p.winner
            );
            let editable = p.week == current && !current_locked && p.result.is_none();
            if editable {
                let keyboard =
                    Keyboard::new().row(vec![ButtonChoice::new("Edit", &Payload::Edit(p.match_id))]);
                replies.push(Outgoing::with_keyboard(text, keyboard));
            } else {
                replies.push(Outgoing::text(text));
            }
        }
        Ok(replies)
    }

    /// `/leaderboard [week]`: totals per user, highest first, capped.
    pub(super) async fn show_leaderboard(&self, arg: Option<&str>) -> Replies {
        let week = arg.and_then(|raw| raw.trim().parse::<u32>().ok());
        let rows = self
            .store
            .leaderboard(week, self.config.leaderboard_size)
            .await?;
        if rows.is_empty() {
            return Ok(vec![Outgoing::text("No points have been scored yet.")]);
        }

        let title = match week {
            Some(week) => format!("Standings for week {week}:"),
            None => "Overall standings:".to_string(),
        };
        let mut lines = vec![title];
        for (rank, row) in rows.iter().enumerate() {
            lines.push(format!(
                "{}. {} ({} point(s))",
                rank + 1,
                row.full_name,
                row.total_points
            ));
        }
        Ok(vec![Outgoing::text(lines.join("\n"))])
    }

    // ==================== Week administration ====================

    pub(super) async fn advance_week(&self) -> Replies {
        let week = self.week.current(&self.store).await? + 1;
        self.store.set_current_week(week).await?;
        self.week.invalidate();
        tracing::info!(week, "Current week advanced");
        Ok(vec![Outgoing::text(format!("Current week moved to {week}."))])
    }

    pub(super) async fn rewind_week(&self) -> Replies {
        let current = self.week.current(&self.store).await?;
        let week = current.saturating_sub(1).max(1);
        self.store.set_current_week(week).await?;
        self.week.invalidate();
        tracing::info!(week, "Current week rewound");
        Ok(vec![Outgoing::text(format!(
            "Current week moved back to {week}."
        ))])
    }

    pub(super) async fn announce_week(&self) -> Replies {
        let week = self.week.current(&self.store).await?;
        let matches = self.store.matches_for_week(week).await?;
        if matches.is_empty() {
            return Ok(vec![Outgoing::text(format!(
                "No matches are defined for week {week}."
            ))]);
        }

        let mut lines = vec![
            format!("Week {week} kicks off!"),
            "This week's matches:".to_string(),
        ];
        for (position, m) in matches.iter().enumerate() {
            lines.push(format!("{}. {} vs {}", position + 1, m.home_team, m.away_team));
        }
        Ok(vec![Outgoing::text(lines.join("\n"))])
    }

    pub(super) async fn close_bets(&self) -> Replies {
        let week = self.week.current(&self.store).await?;
        self.store.lock_week(week).await?;
        tracing::info!(week, "Predictions closed");
        Ok(vec![Outgoing::text(format!(
            "Predictions for week {week} are now closed."
        ))])
    }

    pub(super) async fn open_bets(&self) -> Replies {
        let week = self.week.current(&self.store).await?;
        self.store.unlock_week(week).await?;
        tracing::info!(week, "Predictions reopened");
        Ok(vec![Outgoing::text(format!(
            "Predictions for week {week} are open again."
        ))])
    }

    // ==================== Session control ====================

    pub(super) fn cancel(&self, user_id: i64) -> Vec<Outgoing> {
        if let Some(session) = self.sessions.get(user_id) {
            self.sessions.clear(user_id);
            tracing::debug!(user_id, flow = ?session.flow(), "Flow cancelled");
            vec![Outgoing::text("Cancelled.")]
        } else {
            vec![Outgoing::text("Nothing to cancel.")]
        }
    }

    pub(super) fn help_message(&self) -> Outgoing {
        let rules = &self.config.scoring;
        Outgoing::text(format!(
            "Commands:\n\
             /start - predict this week's matches\n\
             /mybets [week] - your predictions\n\
             /matches - this week's fixtures\n\
             /week - the current week number\n\
             /leaderboard [week] - the standings\n\
             /cancel - abandon the current flow\n\
             /help - this text\n\
             \n\
             Admin commands:\n\
             /setresult - record an official result\n\
             /nextweek - advance the current week\n\
             /prevweek - go back one week\n\
             /startweek - announce this week's fixtures\n\
             /closebets - close predictions for the week\n\
             /openbets - reopen predictions for the week\n\
             \n\
             Scoring: exact score {} point(s), correct winner {} point(s), one side's goals right {} point(s).",
            rules.exact_score, rules.correct_winner, rules.partial_score
        ))
    }
}
