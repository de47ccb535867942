pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS use_cases (
  name        TEXT PRIMARY KEY,
  created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS prompts (
  origin      TEXT NOT NULL,
  use_case    TEXT NOT NULL REFERENCES use_cases(name),
  version     INTEGER NOT NULL,
  template    TEXT NOT NULL,
  created_at  TEXT NOT NULL,
  PRIMARY KEY (origin, use_case, version)
);

CREATE TABLE IF NOT EXISTS assistants (
  origin             TEXT NOT NULL,
  use_case           TEXT NOT NULL REFERENCES use_cases(name),
  version            INTEGER NOT NULL,
  assistant_id       TEXT NOT NULL,
  assistant_version  TEXT NOT NULL,
  api_key            TEXT NOT NULL,
  created_at         TEXT NOT NULL,
  PRIMARY KEY (origin, use_case, version)
);

CREATE TABLE IF NOT EXISTS ratings (
  scope         TEXT NOT NULL,
  origin        TEXT NOT NULL,
  score         REAL NOT NULL,
  games_played  INTEGER NOT NULL CHECK (games_played >= 0),
  updated_at    TEXT NOT NULL,
  PRIMARY KEY (scope, origin)
);

CREATE TABLE IF NOT EXISTS games (
  game_no     INTEGER PRIMARY KEY,
  round_id    TEXT NOT NULL UNIQUE,
  query       TEXT NOT NULL,
  use_case    TEXT NOT NULL,
  origin_a    TEXT NOT NULL,
  origin_b    TEXT NOT NULL,
  response_a  TEXT NOT NULL,
  response_b  TEXT NOT NULL,
  outcome     TEXT NOT NULL,
  verdict     TEXT NOT NULL,
  winner      TEXT NOT NULL,
  created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_games_use_case ON games(use_case);
"#;
