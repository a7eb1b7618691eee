/*!
Initial contents of the store.

Reference data (roles, classes, departments) is inserted whenever its table is
empty. Demo data mirrors a small working Sunday school and is only loaded when
`database.seed_demo_data` is on and the member registry is empty.
*/
use anyhow::Result;
use chrono::Utc;

use crate::auth::rbac::Permission;
use crate::db::DbPool;

struct SeedRole {
    id: &'static str,
    name: &'static str,
    permissions: &'static [Permission],
    class_scoped: bool,
}

const ROLES: &[SeedRole] = &[
    SeedRole {
        id: "admin",
        name: "Admin",
        permissions: &[
            Permission::Dashboard,
            Permission::Members,
            Permission::Classes,
            Permission::Finance,
            Permission::Departments,
            Permission::About,
            Permission::Settings,
            Permission::Reports,
        ],
        class_scoped: false,
    },
    SeedRole {
        id: "teacher",
        name: "Teacher",
        permissions: &[
            Permission::Dashboard,
            Permission::Classes,
            Permission::About,
            Permission::Reports,
        ],
        class_scoped: true,
    },
    SeedRole {
        id: "chief-officer",
        name: "Chief Officer",
        permissions: &[
            Permission::Dashboard,
            Permission::Members,
            Permission::Finance,
            Permission::Departments,
            Permission::About,
            Permission::Reports,
        ],
        class_scoped: false,
    },
];

const CLASSES: &[(&str, &str, &str)] = &[
    ("qedamay", "qedamay", "Ato Solomon"),
    ("kalay", "kalay", "W/ro Aster"),
    ("salsay", "salsay", "Ato Tesfaye"),
    ("rabay", "rabay", "W/ro Abeba"),
];

const DEPARTMENTS: &[(&str, &str)] = &[
    ("children", "Children's Section"),
    ("choir", "Choir Section"),
    ("education", "Education Section"),
    ("general-services", "General Services Section"),
    ("property", "Property Management Section"),
    ("art", "Art Section"),
    ("secretariat", "Secretariat"),
    ("communication", "Communication Section"),
];

pub async fn seed_reference_data(pool: &DbPool) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    let (roles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles").fetch_one(pool).await?;
    if roles == 0 {
        for role in ROLES {
            let tags: Vec<&str> = role.permissions.iter().map(|p| p.as_str()).collect();
            sqlx::query(
                "INSERT INTO roles (id, name, permissions, class_scoped, created_at) VALUES (?, ?, ?, ?, ?)"
            )
            .bind(role.id)
            .bind(role.name)
            .bind(serde_json::to_string(&tags)?)
            .bind(role.class_scoped)
            .bind(&now)
            .execute(pool)
            .await?;
        }
        tracing::info!("Seeded {} roles", ROLES.len());
    }

    let (classes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM classes").fetch_one(pool).await?;
    if classes == 0 {
        for (id, name, teacher) in CLASSES {
            sqlx::query("INSERT INTO classes (id, name, teacher) VALUES (?, ?, ?)")
                .bind(id)
                .bind(name)
                .bind(teacher)
                .execute(pool)
                .await?;
        }
        tracing::info!("Seeded {} classes", CLASSES.len());
    }

    let (departments,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM departments").fetch_one(pool).await?;
    if departments == 0 {
        for (id, name) in DEPARTMENTS {
            sqlx::query("INSERT INTO departments (id, name, created_at) VALUES (?, ?, ?)")
                .bind(id)
                .bind(name)
                .bind(&now)
                .execute(pool)
                .await?;
        }
        tracing::info!("Seeded {} departments", DEPARTMENTS.len());
    }

    Ok(())
}

struct SeedMember {
    code: &'static str,
    name: &'static str,
    age: i64,
    grade: &'static str,
    status: &'static str,
    parent_phone: &'static str,
    gender: &'static str,
    date_of_birth: Option<&'static str>,
    place_of_birth: Option<&'static str>,
    registration_date: Option<&'static str>,
    guardian_name: &'static str,
}

const MEMBERS: &[SeedMember] = &[
    SeedMember { code: "H001", name: "Abebe Bikila", age: 12, grade: "salsay", status: "Active", parent_phone: "+251911234567", gender: "Male", date_of_birth: Some("1932-08-07"), place_of_birth: Some("Jato"), registration_date: Some("2022-09-01"), guardian_name: "Bikila Demissie" },
    SeedMember { code: "H002", name: "Tirunesh Dibaba", age: 10, grade: "rabay", status: "Active", parent_phone: "+251912345678", gender: "Female", date_of_birth: Some("1985-06-01"), place_of_birth: Some("Bekoji"), registration_date: Some("2022-10-20"), guardian_name: "Dibaba Keneni" },
    SeedMember { code: "H003", name: "Haile Gebrselassie", age: 14, grade: "salsay", status: "Transferred", parent_phone: "+251913456789", gender: "Male", date_of_birth: Some("1973-04-18"), place_of_birth: Some("Asella"), registration_date: Some("2021-09-05"), guardian_name: "Gebrselassie Bekele" },
    SeedMember { code: "H004", name: "Kenenisa Bekele", age: 11, grade: "kalay", status: "Active", parent_phone: "+251921234567", gender: "Male", date_of_birth: Some("1982-06-13"), place_of_birth: Some("Bekoji"), registration_date: Some("2022-11-01"), guardian_name: "Bekele Beyecha" },
    SeedMember { code: "H005", name: "Meseret Defar", age: 13, grade: "qedamay", status: "Active", parent_phone: "+251931234567", gender: "Female", date_of_birth: Some("1983-11-19"), place_of_birth: Some("Addis Ababa"), registration_date: Some("2023-01-15"), guardian_name: "Defar Tulu" },
    SeedMember { code: "H006", name: "Student F", age: 6, grade: "qedamay", status: "Active", parent_phone: "+251912345678", gender: "Female", date_of_birth: None, place_of_birth: None, registration_date: None, guardian_name: "Father F" },
    SeedMember { code: "H007", name: "Student G", age: 6, grade: "qedamay", status: "Active", parent_phone: "+251912345678", gender: "Male", date_of_birth: None, place_of_birth: None, registration_date: None, guardian_name: "Father G" },
    SeedMember { code: "H008", name: "Student H", age: 7, grade: "kalay", status: "Active", parent_phone: "+251912345678", gender: "Female", date_of_birth: None, place_of_birth: None, registration_date: None, guardian_name: "Father H" },
    SeedMember { code: "H009", name: "Student I", age: 7, grade: "kalay", status: "Active", parent_phone: "+251912345678", gender: "Male", date_of_birth: None, place_of_birth: None, registration_date: None, guardian_name: "Father I" },
    SeedMember { code: "H010", name: "Student J", age: 8, grade: "rabay", status: "Active", parent_phone: "+251912345678", gender: "Female", date_of_birth: None, place_of_birth: None, registration_date: None, guardian_name: "Father J" },
    SeedMember { code: "H011", name: "Student K", age: 9, grade: "rabay", status: "Active", parent_phone: "+251912345678", gender: "Male", date_of_birth: None, place_of_birth: None, registration_date: None, guardian_name: "Father K" },
];

const TRANSACTIONS: &[(&str, &str, f64, &str, &str)] = &[
    ("2024-05-20", "Weekly Offering", 350.75, "Income", "R-001"),
    ("2024-05-19", "Sunday School Supplies", 85.50, "Expense", "R-002"),
    ("2024-05-18", "Book Sale Fundraiser", 1200.00, "Income", "R-003"),
    ("2024-05-17", "Guest Speaker Honorarium", 150.00, "Expense", "R-004"),
    ("2024-05-13", "Weekly Offering", 325.50, "Income", "R-005"),
];

/// Demo users log in with `password123` and must change it first.
const DEMO_USERS: &[(&str, &str, &str, &str, &[&str])] = &[
    ("Abiy Hailemichael", "abiy@example.org", "0932489095", "Teacher", &["qedamay", "kalay"]),
    ("Alhamdu Yajbo", "alhamdu@example.org", "0933480007", "Chief Officer", &[]),
];

pub async fn seed_demo_data(pool: &DbPool) -> Result<()> {
    let (members,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members").fetch_one(pool).await?;
    if members > 0 {
        tracing::debug!("Member registry not empty; skipping demo data");
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();

    for m in MEMBERS {
        sqlx::query(
            "INSERT INTO members (student_code, name, age, grade, status, parent_phone, gender,
                date_of_birth, place_of_birth, registration_date, address, guardian_name,
                guardian_relationship, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'Addis Ababa, Ethiopia', ?, 'Father', ?, ?)"
        )
        .bind(m.code)
        .bind(m.name)
        .bind(m.age)
        .bind(m.grade)
        .bind(m.status)
        .bind(m.parent_phone)
        .bind(m.gender)
        .bind(m.date_of_birth)
        .bind(m.place_of_birth)
        .bind(m.registration_date)
        .bind(m.guardian_name)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    for (date, description, amount, kind, receipt) in TRANSACTIONS {
        sqlx::query(
            "INSERT INTO transactions (date, description, amount, kind, receipt_number, created_at)
             VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(date)
        .bind(description)
        .bind(amount)
        .bind(kind)
        .bind(receipt)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    for (date, content) in [
        ("2024-05-19", "This week we covered the story of David and Goliath. All students participated well, and their homework was satisfactory."),
        ("2024-05-12", "Review of the Ten Commandments. Some students are struggling to memorize them. Plan to do a review session next week."),
    ] {
        sqlx::query(
            "INSERT INTO class_reports (class_id, date, submitted_by, content, created_at)
             VALUES ('qedamay', ?, 'Ato Solomon', ?, ?)"
        )
        .bind(date)
        .bind(content)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    for (department, date, by, content, attachment, recipients) in [
        ("children", "2024-05-18", "W/ro Martha", "Finalized the curriculum for the upcoming month. Materials have been ordered.", None, "[]"),
        ("education", "2024-05-20", "Ato Daniel", "Guest speaker confirmed for next Sunday.", Some("GuestSpeaker-Bio.pdf"), r#"["choir"]"#),
        ("education", "2024-05-13", "Ato Daniel", "Reviewed educational materials for the youth group.", None, "[]"),
    ] {
        sqlx::query(
            "INSERT INTO department_reports (department_id, date, submitted_by, content, attachment_name, recipients, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(department)
        .bind(date)
        .bind(by)
        .bind(content)
        .bind(attachment)
        .bind(recipients)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    // Two past Sundays for qedamay.
    for (date, absent_code) in [("2024-05-19", Some("H007")), ("2024-05-12", None)] {
        let log_id = sqlx::query(
            "INSERT INTO attendance_logs (class_id, date, submitted_by) VALUES ('qedamay', ?, 'Ato Solomon')"
        )
        .bind(date)
        .execute(pool)
        .await?
        .last_insert_rowid();

        let roster: Vec<(i64, String, String)> = sqlx::query_as(
            "SELECT id, name, student_code FROM members WHERE grade = 'qedamay'"
        )
        .fetch_all(pool)
        .await?;

        for (member_id, name, code) in roster {
            let status = if Some(code.as_str()) == absent_code { "absent" } else { "present" };
            sqlx::query(
                "INSERT INTO attendance_marks (log_id, member_id, member_name, status) VALUES (?, ?, ?, ?)"
            )
            .bind(log_id)
            .bind(member_id)
            .bind(&name)
            .bind(status)
            .execute(pool)
            .await?;
        }
    }

    sqlx::query(
        "INSERT INTO member_transfers (member_id, member_name, from_class, to_class, date)
         VALUES (NULL, 'Haile Gebrselassie', 'kalay', 'salsay', '2023-09-01')"
    )
    .execute(pool)
    .await?;

    let password = crate::auth::password::hash("password123")?;
    for (name, email, phone, role, classes) in DEMO_USERS {
        sqlx::query(
            "INSERT OR IGNORE INTO users (name, email, phone, role, assigned_classes, password, is_first_login, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)"
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(role)
        .bind(serde_json::to_string(classes)?)
        .bind(&password)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded demo data: {} members, {} transactions", MEMBERS.len(), TRANSACTIONS.len());
    Ok(())
}
