/// Statements run at startup. Each is executed on its own because prepared
/// statements cannot carry more than one command.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id BIGSERIAL PRIMARY KEY,
        provider_message_id VARCHAR(255) UNIQUE NOT NULL,
        from_number VARCHAR(32) NOT NULL,
        to_number VARCHAR(32) NOT NULL,
        message_type VARCHAR(50) NOT NULL DEFAULT 'text',
        content TEXT,
        media_url TEXT,
        caption TEXT,
        sender_name VARCHAR(255) DEFAULT 'Usuario',
        conversation_id VARCHAR(255) NOT NULL,
        session_id VARCHAR(255),
        timestamp TIMESTAMPTZ NOT NULL,
        received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        processed BOOLEAN NOT NULL DEFAULT FALSE,
        auto_response_sent BOOLEAN NOT NULL DEFAULT FALSE,
        intent_detected VARCHAR(100),
        metadata JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_from_number ON messages(from_number)",
    "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_messages_processed ON messages(processed)",
];

pub const UPSERT_MESSAGE: &str = r#"
    INSERT INTO messages (
        provider_message_id, from_number, to_number, message_type,
        content, media_url, caption, sender_name, conversation_id,
        session_id, timestamp, received_at, metadata
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
    ON CONFLICT (provider_message_id) DO UPDATE SET
        updated_at = NOW()
    RETURNING *
"#;

pub const DAILY_STATS: &str = r#"
    SELECT
        (timestamp AT TIME ZONE 'UTC')::date AS date,
        COUNT(*) AS total_messages,
        COUNT(*) FILTER (WHERE message_type = 'text') AS text_messages,
        COUNT(*) FILTER (WHERE message_type = 'image') AS image_messages,
        COUNT(*) FILTER (WHERE processed) AS processed_messages,
        COUNT(*) FILTER (WHERE auto_response_sent) AS auto_responses,
        COUNT(DISTINCT from_number) AS unique_users,
        COUNT(DISTINCT conversation_id) AS unique_conversations
    FROM messages
    WHERE timestamp >= NOW() - make_interval(days => $1)
    GROUP BY 1
    ORDER BY 1 DESC
"#;
