use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::debug;

use crate::api_error::ApiError;
use crate::db::{self, map_sqlx_error, DbPool};
use crate::models::{
    AvatarStyle, Goal, GoalType, Match, MatchFilter, MatchStatus, MatchType, Player,
    PlayerFilter, Team, TeamSide,
};
use crate::store::LeagueStore;

/// Postgres-backed store. Rosters are stored as player ids and joined on read.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, FromRow)]
struct PlayerRow {
    id: String,
    name: String,
    email: String,
    avatar_style: Option<String>,
    creator_id: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct MatchRow {
    id: String,
    #[sqlx(rename = "type")]
    match_type: String,
    status: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    team1_score: i32,
    team2_score: i32,
    team1_player1_id: String,
    team1_player2_id: String,
    team2_player1_id: String,
    team2_player2_id: String,
    referee_id: Option<String>,
    bet: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct GoalRow {
    id: String,
    match_id: String,
    team: String,
    player_id: String,
    #[sqlx(rename = "type")]
    goal_type: String,
    points: i32,
    timestamp: DateTime<Utc>,
}

/// Stored text that no longer parses is a decoding failure, not a caller mistake.
fn decode<T: std::str::FromStr<Err = ApiError>>(value: &str) -> Result<T, ApiError> {
    value
        .parse::<T>()
        .map_err(|e| ApiError::DatabaseError(sqlx::Error::Decode(Box::new(e))))
}

impl TryFrom<PlayerRow> for Player {
    type Error = ApiError;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        let avatar_style = row
            .avatar_style
            .as_deref()
            .map(decode::<AvatarStyle>)
            .transpose()?;

        Ok(Player {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar_style,
            creator_id: row.creator_id,
        })
    }
}

impl TryFrom<GoalRow> for Goal {
    type Error = ApiError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        Ok(Goal {
            id: row.id,
            team: decode::<TeamSide>(&row.team)?,
            player_id: row.player_id,
            goal_type: decode::<GoalType>(&row.goal_type)?,
            points: row.points,
            timestamp: row.timestamp,
        })
    }
}

const MATCH_COLUMNS: &str = "id, type, status, start_date, end_date, team1_score, team2_score, \
     team1_player1_id, team1_player2_id, team2_player1_id, team2_player2_id, referee_id, bet";

impl PgStore {
    /// Join rosters, referees and goals onto raw match rows.
    async fn hydrate(&self, rows: Vec<MatchRow>) -> Result<Vec<Match>, ApiError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let match_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut player_ids: Vec<String> = rows
            .iter()
            .flat_map(|r| {
                [
                    Some(r.team1_player1_id.clone()),
                    Some(r.team1_player2_id.clone()),
                    Some(r.team2_player1_id.clone()),
                    Some(r.team2_player2_id.clone()),
                    r.referee_id.clone(),
                ]
            })
            .flatten()
            .collect();
        player_ids.sort();
        player_ids.dedup();

        let players: HashMap<String, Player> =
            sqlx::query_as::<_, PlayerRow>("SELECT id, name, email, avatar_style, creator_id FROM players WHERE id = ANY($1)")
                .bind(&player_ids)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?
                .into_iter()
                .map(|row| Player::try_from(row).map(|p| (p.id.clone(), p)))
                .collect::<Result<_, _>>()?;

        let goal_rows = sqlx::query_as::<_, GoalRow>(
            "SELECT id, match_id, team, player_id, type, points, timestamp \
             FROM goals WHERE match_id = ANY($1) ORDER BY timestamp ASC",
        )
        .bind(&match_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut goals: HashMap<String, Vec<Goal>> = HashMap::new();
        for row in goal_rows {
            let match_id = row.match_id.clone();
            goals.entry(match_id).or_default().push(Goal::try_from(row)?);
        }

        let player = |id: &str| {
            players
                .get(id)
                .cloned()
                .unwrap_or_else(|| Player::unknown(id))
        };

        rows.into_iter()
            .map(|row| -> Result<Match, ApiError> {
                Ok(Match {
                    match_type: decode::<MatchType>(&row.match_type)?,
                    status: decode::<MatchStatus>(&row.status)?,
                    start_date: row.start_date,
                    end_date: row.end_date,
                    team1: Team {
                        players: [player(&row.team1_player1_id), player(&row.team1_player2_id)],
                        score: row.team1_score,
                    },
                    team2: Team {
                        players: [player(&row.team2_player1_id), player(&row.team2_player2_id)],
                        score: row.team2_score,
                    },
                    referee: row.referee_id.as_deref().map(player),
                    bet: row.bet.as_deref().map(decode::<TeamSide>).transpose()?,
                    goals: goals.remove(&row.id).unwrap_or_default(),
                    id: row.id,
                })
            })
            .collect()
    }
}

impl LeagueStore for PgStore {
    async fn get_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, ApiError> {
        sqlx::query_as::<_, PlayerRow>(
            "SELECT id, name, email, avatar_style, creator_id FROM players \
             WHERE ($1::text IS NULL OR creator_id = $1) \
             ORDER BY created_at ASC",
        )
        .bind(filter.creator_id.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .into_iter()
        .map(Player::try_from)
        .collect()
    }

    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>, ApiError> {
        sqlx::query_as::<_, PlayerRow>(
            "SELECT id, name, email, avatar_style, creator_id FROM players WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .map(Player::try_from)
        .transpose()
    }

    async fn save_player(&self, player: &Player) -> Result<Player, ApiError> {
        let row = sqlx::query_as::<_, PlayerRow>(
            r#"
            INSERT INTO players (id, name, email, avatar_style, creator_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                avatar_style = EXCLUDED.avatar_style
            RETURNING id, name, email, avatar_style, creator_id
            "#,
        )
        .bind(&player.id)
        .bind(&player.name)
        .bind(&player.email)
        .bind(player.avatar_style.map(|s| s.as_str()))
        .bind(player.creator_id.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::DuplicateEmail(player.email.clone())
            }
            _ => map_sqlx_error(e),
        })?;

        Player::try_from(row)
    }

    async fn delete_player(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>, ApiError> {
        let sql = format!(
            "SELECT {} FROM matches \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::text IS NULL OR type = $2) \
               AND ($3::text IS NULL OR $3 IN (team1_player1_id, team1_player2_id, team2_player1_id, team2_player2_id)) \
             ORDER BY created_at ASC",
            MATCH_COLUMNS
        );

        let rows = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.match_type.map(|t| t.as_str()))
            .bind(filter.player_id.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(count = rows.len(), "Loaded match rows");
        self.hydrate(rows).await
    }

    async fn get_match_by_id(&self, id: &str) -> Result<Option<Match>, ApiError> {
        let sql = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);
        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn save_match(&self, m: &Match) -> Result<Match, ApiError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        upsert_match(&mut tx, m).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        self.get_match_by_id(&m.id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Match {} not found", m.id)))
    }

    async fn append_goal(&self, m: &Match, goal: &Goal) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            "UPDATE matches SET team1_score = $1, team2_score = $2, status = $3, end_date = $4 \
             WHERE id = $5",
        )
        .bind(m.team1.score)
        .bind(m.team2.score)
        .bind(m.status.as_str())
        .bind(m.end_date)
        .bind(&m.id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("Match {} not found", m.id)));
        }

        insert_goal(&mut tx, &m.id, goal).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn save_match_with_goals(&self, m: &Match) -> Result<Match, ApiError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        upsert_match(&mut tx, m).await?;

        sqlx::query("DELETE FROM goals WHERE match_id = $1")
            .bind(&m.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for goal in &m.goals {
            insert_goal(&mut tx, &m.id, goal).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        self.get_match_by_id(&m.id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Match {} not found", m.id)))
    }

    async fn ping(&self) -> Result<(), ApiError> {
        db::health_check(&self.pool).await
    }
}

async fn upsert_match(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    m: &Match,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        INSERT INTO matches (
            id, type, status, start_date, end_date, team1_score, team2_score,
            team1_player1_id, team1_player2_id, team2_player1_id, team2_player2_id,
            referee_id, bet
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE
        SET type = EXCLUDED.type,
            status = EXCLUDED.status,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            team1_score = EXCLUDED.team1_score,
            team2_score = EXCLUDED.team2_score,
            team1_player1_id = EXCLUDED.team1_player1_id,
            team1_player2_id = EXCLUDED.team1_player2_id,
            team2_player1_id = EXCLUDED.team2_player1_id,
            team2_player2_id = EXCLUDED.team2_player2_id,
            referee_id = EXCLUDED.referee_id,
            bet = EXCLUDED.bet
        "#,
    )
    .bind(&m.id)
    .bind(m.match_type.as_str())
    .bind(m.status.as_str())
    .bind(m.start_date)
    .bind(m.end_date)
    .bind(m.team1.score)
    .bind(m.team2.score)
    .bind(&m.team1.players[0].id)
    .bind(&m.team1.players[1].id)
    .bind(&m.team2.players[0].id)
    .bind(&m.team2.players[1].id)
    .bind(m.referee.as_ref().map(|r| r.id.as_str()))
    .bind(m.bet.map(|b| b.as_str()))
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

async fn insert_goal(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    match_id: &str,
    goal: &Goal,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO goals (id, match_id, team, player_id, type, points, timestamp) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&goal.id)
    .bind(match_id)
    .bind(goal.team.as_str())
    .bind(&goal.player_id)
    .bind(goal.goal_type.as_str())
    .bind(goal.points)
    .bind(goal.timestamp)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}
