//! Stored procedures
//!
//! Procedure names used by the services, and the catalog that backs them on
//! SQLite. A procedure is an ordered list of statements with `@name`
//! placeholders, run in one transaction. When the last statement is a
//! `SELECT`, its rows are the procedure's result set; for writes, its first
//! row carries the output parameters.

use std::collections::HashMap;

/// Procedure names
pub mod names {
    /// Create a chat room for a customer
    pub const CHAT_CREATE_ROOM: &str = "usp_Chat_CreateRoom";
    /// Paged chat room search
    pub const CHAT_SEARCH_ROOMS: &str = "usp_Chat_SearchRooms";
    /// Total of a chat room search
    pub const CHAT_COUNT_ROOMS: &str = "usp_Chat_CountRooms";
    /// Post a message to an active room
    pub const CHAT_SEND_MESSAGE: &str = "usp_Chat_SendMessage";
    /// Paged message history of a room
    pub const CHAT_GET_MESSAGES: &str = "usp_Chat_GetMessages";
    /// Total of a message history search
    pub const CHAT_COUNT_MESSAGES: &str = "usp_Chat_CountMessages";
    /// Close an active room
    pub const CHAT_CLOSE_ROOM: &str = "usp_Chat_CloseRoom";

    /// Paged claimant search
    pub const CLAIMANT_SEARCH: &str = "usp_Claimant_Search";
    /// Total of a claimant search
    pub const CLAIMANT_COUNT: &str = "usp_Claimant_Count";
    /// Single claimant by id
    pub const CLAIMANT_GET: &str = "usp_Claimant_Get";
    /// Insert or update a claimant
    pub const CLAIMANT_SAVE: &str = "usp_Claimant_Save";

    /// Paged claim search
    pub const CLAIMS_SEARCH: &str = "usp_Claims_Search";
    /// Total of a claim search
    pub const CLAIMS_COUNT: &str = "usp_Claims_Count";
    /// Create a claim
    pub const CLAIMS_CREATE: &str = "usp_Claims_Create";
    /// Change a claim's status
    pub const CLAIMS_UPDATE_STATUS: &str = "usp_Claims_UpdateStatus";

    /// Queue an outbound email
    pub const EMAIL_QUEUE: &str = "usp_Email_Queue";
    /// Email templates of a tenant
    pub const EMAIL_GET_TEMPLATES: &str = "usp_Email_GetTemplates";
    /// Insert or update an email template
    pub const EMAIL_SAVE_TEMPLATE: &str = "usp_Email_SaveTemplate";
    /// Paged email log search
    pub const EMAIL_SEARCH: &str = "usp_Email_Search";
    /// Total of an email log search
    pub const EMAIL_COUNT: &str = "usp_Email_Count";

    /// Customer name and company lookup
    pub const MISC_GET_CUSTOMER_INFO: &str = "usp_Misc_GetCustomerInfo";
    /// Create a customer
    pub const MISC_SAVE_CUSTOMER: &str = "usp_Misc_SaveCustomer";
    /// Claim status lookup
    pub const MISC_GET_CLAIM_STATUSES: &str = "usp_Misc_GetClaimStatuses";
    /// State lookup
    pub const MISC_GET_STATES: &str = "usp_Misc_GetStates";
    /// Per-tenant dashboard counters
    pub const MISC_GET_DASHBOARD_COUNTS: &str = "usp_Misc_GetDashboardCounts";
}

/// A stored procedure body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    /// Procedure name
    pub name: String,
    /// Statements, executed in order
    pub statements: Vec<String>,
}

impl Procedure {
    /// Create a procedure from its statements
    pub fn new(name: &str, statements: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            statements: statements.iter().map(|s| s.trim().to_string()).collect(),
        }
    }

    /// Whether the final statement projects rows
    pub fn ends_with_select(&self) -> bool {
        self.statements.last().is_some_and(|s| is_select(s))
    }
}

/// Whether a statement is a `SELECT` (or a `WITH ... SELECT`)
pub fn is_select(statement: &str) -> bool {
    let head: String = statement
        .trim_start()
        .chars()
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    head.starts_with("SELECT") || head.starts_with("WITH")
}

/// Registry of procedures, looked up case-insensitively
#[derive(Debug, Clone, Default)]
pub struct ProcedureCatalog {
    procedures: HashMap<String, Procedure>,
}

impl ProcedureCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a procedure
    pub fn register(&mut self, procedure: Procedure) {
        self.procedures
            .insert(procedure.name.to_ascii_lowercase(), procedure);
    }

    /// Look up a procedure by name
    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(&name.to_ascii_lowercase())
    }

    /// Number of registered procedures
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// The procedures used by the services
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for procedure in standard_procedures() {
            catalog.register(procedure);
        }
        catalog
    }
}

fn standard_procedures() -> Vec<Procedure> {
    let mut procedures = vec![
        // Chat
        Procedure::new(
            names::CHAT_CREATE_ROOM,
            &[
                "INSERT INTO chat_rooms (tenant_id, customer_id, claim_id, room_name, status, created_by)
                 SELECT @tenant_id, @customer_id, @claim_id, @room_name, 'Active', @created_by
                 WHERE EXISTS (SELECT 1 FROM customers WHERE tenant_id = @tenant_id AND customer_id = @customer_id)",
                "SELECT CASE WHEN changes() > 0 THEN last_insert_rowid() END AS room_id,
                        CASE WHEN changes() > 0 THEN 1 ELSE 0 END AS response_code,
                        CASE WHEN changes() > 0 THEN 'Room created successfully' ELSE 'Customer not found' END AS message,
                        CASE WHEN changes() > 0 THEN 'Active' END AS status",
            ],
        ),
        Procedure::new(
            names::CHAT_SEND_MESSAGE,
            &[
                "INSERT INTO chat_messages (room_id, sender, body)
                 SELECT @room_id, @sender, @body
                 WHERE EXISTS (SELECT 1 FROM chat_rooms
                               WHERE room_id = @room_id AND tenant_id = @tenant_id AND status = 'Active')",
                "SELECT CASE WHEN changes() > 0 THEN last_insert_rowid() END AS message_id,
                        CASE WHEN changes() > 0 THEN 1 ELSE 0 END AS response_code,
                        CASE WHEN changes() > 0 THEN 'Message sent' ELSE 'Room is not active' END AS message",
            ],
        ),
        Procedure::new(
            names::CHAT_CLOSE_ROOM,
            &[
                "UPDATE chat_rooms SET status = 'Closed', closed_at = datetime('now')
                 WHERE room_id = @room_id AND tenant_id = @tenant_id AND status = 'Active'",
                "SELECT CASE WHEN changes() > 0 THEN 1 ELSE 0 END AS response_code,
                        CASE WHEN changes() > 0 THEN 'Room closed' ELSE 'Room not found or already closed' END AS message,
                        (SELECT status FROM chat_rooms WHERE room_id = @room_id AND tenant_id = @tenant_id) AS status",
            ],
        ),
        // Claimants
        Procedure::new(
            names::CLAIMANT_GET,
            &["SELECT claimant_id, customer_id, first_name, last_name, email, phone, date_of_birth,
                      state_code, is_active, created_at, updated_at
               FROM claimants
               WHERE tenant_id = @tenant_id AND claimant_id = @claimant_id"],
        ),
        Procedure::new(
            names::CLAIMANT_SAVE,
            &[
                "UPDATE claimants
                 SET customer_id = COALESCE(@customer_id, customer_id),
                     first_name = @first_name,
                     last_name = @last_name,
                     email = COALESCE(@email, email),
                     phone = COALESCE(@phone, phone),
                     date_of_birth = COALESCE(@date_of_birth, date_of_birth),
                     state_code = COALESCE(@state_code, state_code),
                     is_active = COALESCE(@is_active, is_active),
                     updated_at = datetime('now')
                 WHERE claimant_id = @claimant_id AND tenant_id = @tenant_id",
                "INSERT INTO claimants (tenant_id, customer_id, first_name, last_name, email, phone,
                                        date_of_birth, state_code, is_active)
                 SELECT @tenant_id, @customer_id, @first_name, @last_name, @email, @phone,
                        @date_of_birth, @state_code, COALESCE(@is_active, 1)
                 WHERE @claimant_id IS NULL",
                "SELECT CASE
                            WHEN @claimant_id IS NULL THEN last_insert_rowid()
                            WHEN EXISTS (SELECT 1 FROM claimants WHERE claimant_id = @claimant_id AND tenant_id = @tenant_id)
                                THEN @claimant_id
                        END AS claimant_id,
                        CASE
                            WHEN @claimant_id IS NULL THEN 1
                            WHEN EXISTS (SELECT 1 FROM claimants WHERE claimant_id = @claimant_id AND tenant_id = @tenant_id)
                                THEN 1
                            ELSE 0
                        END AS response_code,
                        CASE
                            WHEN @claimant_id IS NULL THEN 'Claimant created'
                            WHEN EXISTS (SELECT 1 FROM claimants WHERE claimant_id = @claimant_id AND tenant_id = @tenant_id)
                                THEN 'Claimant updated'
                            ELSE 'Claimant not found'
                        END AS message",
            ],
        ),
        // Claims
        Procedure::new(
            names::CLAIMS_CREATE,
            &[
                "INSERT INTO claims (tenant_id, customer_id, claimant_id, claim_number, status_id,
                                     description, amount, incident_date)
                 SELECT @tenant_id, @customer_id, @claimant_id, @claim_number, COALESCE(@status_id, 1),
                        @description, COALESCE(@amount, 0), @incident_date
                 WHERE NOT EXISTS (SELECT 1 FROM claims WHERE tenant_id = @tenant_id AND claim_number = @claim_number)",
                "SELECT CASE WHEN changes() > 0 THEN last_insert_rowid() END AS claim_id,
                        CASE WHEN changes() > 0 THEN 1 ELSE 0 END AS response_code,
                        CASE WHEN changes() > 0 THEN 'Claim created' ELSE 'Claim number already exists' END AS message",
            ],
        ),
        Procedure::new(
            names::CLAIMS_UPDATE_STATUS,
            &[
                "UPDATE claims SET status_id = @status_id, updated_at = datetime('now')
                 WHERE claim_id = @claim_id AND tenant_id = @tenant_id
                   AND EXISTS (SELECT 1 FROM claim_statuses WHERE status_id = @status_id)",
                "SELECT CASE WHEN changes() > 0 THEN 1 ELSE 0 END AS response_code,
                        CASE WHEN changes() > 0 THEN 'Claim status updated' ELSE 'Claim or status not found' END AS message,
                        (SELECT s.status_name FROM claims c
                         JOIN claim_statuses s ON s.status_id = c.status_id
                         WHERE c.claim_id = @claim_id AND c.tenant_id = @tenant_id) AS status",
            ],
        ),
        // Email
        Procedure::new(
            names::EMAIL_QUEUE,
            &[
                "INSERT INTO emails (tenant_id, claim_id, template_id, recipient, subject, body, tracking_id)
                 SELECT @tenant_id, @claim_id, t.template_id, @recipient,
                        COALESCE(@subject, t.subject), COALESCE(@body, t.body, ''), @tracking_id
                 FROM (SELECT 1) AS one
                 LEFT JOIN email_templates t ON t.tenant_id = @tenant_id AND t.template_code = @template_code
                 WHERE COALESCE(@subject, t.subject) IS NOT NULL",
                "SELECT CASE WHEN changes() > 0 THEN last_insert_rowid() END AS email_id,
                        CASE WHEN changes() > 0 THEN 1 ELSE 0 END AS response_code,
                        CASE WHEN changes() > 0 THEN 'Email queued' ELSE 'Email subject or template is required' END AS message",
            ],
        ),
        Procedure::new(
            names::EMAIL_GET_TEMPLATES,
            &["SELECT template_id, template_code, subject, body
               FROM email_templates
               WHERE tenant_id = @tenant_id
               ORDER BY template_code"],
        ),
        Procedure::new(
            names::EMAIL_SAVE_TEMPLATE,
            &[
                "INSERT INTO email_templates (tenant_id, template_code, subject, body)
                 VALUES (@tenant_id, @template_code, @subject, COALESCE(@body, ''))
                 ON CONFLICT (tenant_id, template_code)
                 DO UPDATE SET subject = excluded.subject, body = excluded.body",
                "SELECT (SELECT template_id FROM email_templates
                         WHERE tenant_id = @tenant_id AND template_code = @template_code) AS template_id,
                        1 AS response_code,
                        'Template saved' AS message",
            ],
        ),
        // Miscellaneous
        Procedure::new(
            names::MISC_GET_CUSTOMER_INFO,
            &["SELECT customer_id, customer_name, company_name
               FROM customers
               WHERE tenant_id = @tenant_id AND customer_id = @customer_id"],
        ),
        Procedure::new(
            names::MISC_SAVE_CUSTOMER,
            &[
                "INSERT INTO customers (tenant_id, customer_name, company_name, email)
                 VALUES (@tenant_id, @customer_name, COALESCE(@company_name, ''), @email)",
                "SELECT last_insert_rowid() AS customer_id,
                        1 AS response_code,
                        'Customer saved' AS message",
            ],
        ),
        Procedure::new(
            names::MISC_GET_CLAIM_STATUSES,
            &["SELECT status_id, status_name, sort_order FROM claim_statuses ORDER BY sort_order"],
        ),
        Procedure::new(
            names::MISC_GET_STATES,
            &["SELECT state_code, state_name FROM states ORDER BY state_name"],
        ),
        Procedure::new(
            names::MISC_GET_DASHBOARD_COUNTS,
            &["SELECT (SELECT COUNT(*) FROM claims WHERE tenant_id = @tenant_id) AS total_claims,
                      (SELECT COUNT(*) FROM claims c
                       JOIN claim_statuses s ON s.status_id = c.status_id
                       WHERE c.tenant_id = @tenant_id
                         AND s.status_name NOT IN ('Closed', 'Denied')) AS open_claims,
                      (SELECT COUNT(*) FROM chat_rooms
                       WHERE tenant_id = @tenant_id AND status = 'Active') AS active_rooms,
                      (SELECT COUNT(*) FROM emails
                       WHERE tenant_id = @tenant_id AND is_sent = 0) AS pending_emails"],
        ),
    ];

    procedures.extend(paged_search(
        names::CHAT_SEARCH_ROOMS,
        names::CHAT_COUNT_ROOMS,
        "r.room_id, r.customer_id, r.claim_id, r.room_name, r.status, r.created_by,
         r.created_at, r.closed_at,
         (SELECT COUNT(*) FROM chat_messages m WHERE m.room_id = r.room_id) AS message_count",
        "FROM chat_rooms r
         WHERE r.tenant_id = @tenant_id
           AND r.customer_id = @customer_id
           AND (@room_id IS NULL OR r.room_id = @room_id)
           AND (@claim_id IS NULL OR r.claim_id = @claim_id)
           AND (@status IS NULL OR r.status = @status)
           AND (@room_name IS NULL OR r.room_name LIKE @room_name)",
        "r.created_at DESC, r.room_id DESC",
    ));
    procedures.extend(paged_search(
        names::CHAT_GET_MESSAGES,
        names::CHAT_COUNT_MESSAGES,
        "m.message_id, m.room_id, m.sender, m.body, m.created_at",
        "FROM chat_messages m
         JOIN chat_rooms r ON r.room_id = m.room_id
         WHERE r.tenant_id = @tenant_id
           AND m.room_id = @room_id
           AND (@sender IS NULL OR m.sender = @sender)",
        "m.created_at, m.message_id",
    ));
    procedures.extend(paged_search(
        names::CLAIMANT_SEARCH,
        names::CLAIMANT_COUNT,
        "claimant_id, customer_id, first_name, last_name, email, phone, date_of_birth,
         state_code, is_active, created_at, updated_at",
        "FROM claimants
         WHERE tenant_id = @tenant_id
           AND (@claimant_id IS NULL OR claimant_id = @claimant_id)
           AND (@customer_id IS NULL OR customer_id = @customer_id)
           AND (@first_name IS NULL OR first_name LIKE @first_name)
           AND (@last_name IS NULL OR last_name LIKE @last_name)
           AND (@email IS NULL OR email = @email)
           AND (@state_code IS NULL OR state_code = @state_code)
           AND (@is_active IS NULL OR is_active = @is_active)",
        "last_name, first_name, claimant_id",
    ));
    procedures.extend(paged_search(
        names::CLAIMS_SEARCH,
        names::CLAIMS_COUNT,
        "c.claim_id, c.customer_id, c.claimant_id,
         cl.first_name || ' ' || cl.last_name AS claimant_name,
         c.claim_number, c.status_id, s.status_name, c.description, c.amount,
         c.incident_date, c.created_at, c.updated_at",
        "FROM claims c
         JOIN claim_statuses s ON s.status_id = c.status_id
         LEFT JOIN claimants cl ON cl.claimant_id = c.claimant_id
         WHERE c.tenant_id = @tenant_id
           AND (@claim_id IS NULL OR c.claim_id = @claim_id)
           AND (@customer_id IS NULL OR c.customer_id = @customer_id)
           AND (@claimant_id IS NULL OR c.claimant_id = @claimant_id)
           AND (@status_id IS NULL OR c.status_id = @status_id)
           AND (@claim_number IS NULL OR c.claim_number LIKE @claim_number)
           AND (@from_date IS NULL OR c.incident_date >= @from_date)
           AND (@to_date IS NULL OR c.incident_date <= @to_date)",
        "c.created_at DESC, c.claim_id DESC",
    ));
    procedures.extend(paged_search(
        names::EMAIL_SEARCH,
        names::EMAIL_COUNT,
        "email_id, claim_id, template_id, recipient, subject, tracking_id, is_sent,
         sent_at, created_at",
        "FROM emails
         WHERE tenant_id = @tenant_id
           AND (@claim_id IS NULL OR claim_id = @claim_id)
           AND (@recipient IS NULL OR recipient LIKE @recipient)
           AND (@is_sent IS NULL OR is_sent = @is_sent)",
        "created_at DESC, email_id DESC",
    ));

    procedures
}

/// A paged search and its count companion, sharing one `FROM ... WHERE` clause
///
/// Every search row carries `total_count`; the companion answers the same
/// total when the requested page is past the end.
fn paged_search(
    name: &str,
    count_name: &str,
    columns: &str,
    filter: &str,
    order_by: &str,
) -> [Procedure; 2] {
    let search = format!(
        "SELECT {}, COUNT(*) OVER () AS total_count {} ORDER BY {} LIMIT @limit OFFSET @offset",
        columns, filter, order_by
    );
    let count = format!("SELECT COUNT(*) AS total_count {}", filter);
    [
        Procedure::new(name, &[search.as_str()]),
        Procedure::new(count_name, &[count.as_str()]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_has_every_service_procedure() {
        let catalog = ProcedureCatalog::standard();
        for name in [
            names::CHAT_CREATE_ROOM,
            names::CHAT_SEARCH_ROOMS,
            names::CHAT_SEND_MESSAGE,
            names::CHAT_GET_MESSAGES,
            names::CHAT_CLOSE_ROOM,
            names::CLAIMANT_SEARCH,
            names::CLAIMANT_GET,
            names::CLAIMANT_SAVE,
            names::CLAIMS_SEARCH,
            names::CLAIMS_CREATE,
            names::CLAIMS_UPDATE_STATUS,
            names::EMAIL_QUEUE,
            names::EMAIL_GET_TEMPLATES,
            names::EMAIL_SAVE_TEMPLATE,
            names::EMAIL_SEARCH,
            names::MISC_GET_CUSTOMER_INFO,
            names::MISC_SAVE_CUSTOMER,
            names::MISC_GET_CLAIM_STATUSES,
            names::MISC_GET_STATES,
            names::MISC_GET_DASHBOARD_COUNTS,
            names::CHAT_COUNT_ROOMS,
            names::CHAT_COUNT_MESSAGES,
            names::CLAIMANT_COUNT,
            names::CLAIMS_COUNT,
            names::EMAIL_COUNT,
        ] {
            assert!(catalog.get(name).is_some(), "missing procedure {}", name);
        }
        assert_eq!(catalog.len(), 25);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = ProcedureCatalog::standard();
        assert!(catalog.get("USP_CHAT_CREATEROOM").is_some());
        assert!(catalog.get("usp_Unknown").is_none());
    }

    #[test]
    fn test_write_procedures_end_with_output_projection() {
        let catalog = ProcedureCatalog::standard();
        let create = catalog.get(names::CHAT_CREATE_ROOM).unwrap();
        assert_eq!(create.statements.len(), 2);
        assert!(create.ends_with_select());
        assert!(!is_select(&create.statements[0]));
    }

    #[test]
    fn test_paged_search_and_count_share_filter() {
        let catalog = ProcedureCatalog::standard();
        let search = &catalog.get(names::CLAIMANT_SEARCH).unwrap().statements[0];
        let count = &catalog.get(names::CLAIMANT_COUNT).unwrap().statements[0];

        assert!(search.contains("COUNT(*) OVER () AS total_count"));
        assert!(search.ends_with("LIMIT @limit OFFSET @offset"));
        assert!(count.starts_with("SELECT COUNT(*) AS total_count FROM claimants"));
        assert!(!count.contains("LIMIT"));
        let filter = count.trim_start_matches("SELECT COUNT(*) AS total_count ");
        assert!(search.contains(filter));
    }

    #[test]
    fn test_is_select() {
        assert!(is_select("  select 1"));
        assert!(is_select("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!is_select("UPDATE claims SET amount = 0"));
    }
}
