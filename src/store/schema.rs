pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    program_id INTEGER NOT NULL REFERENCES programs(id) ON DELETE RESTRICT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS academic_years (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL UNIQUE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS semesters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    academic_year_id INTEGER NOT NULL REFERENCES academic_years(id) ON DELETE CASCADE,
    number INTEGER NOT NULL CHECK (number BETWEEN 1 AND 8),
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0,
    UNIQUE (academic_year_id, number)
);

CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    program_id INTEGER NOT NULL REFERENCES programs(id) ON DELETE RESTRICT,
    admission_year INTEGER NOT NULL,
    session TEXT NOT NULL,
    registration_number TEXT NOT NULL UNIQUE,
    sequence_code TEXT UNIQUE,
    static_code TEXT UNIQUE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sequence_counters (
    name TEXT PRIMARY KEY,
    last_code TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS access_numbers (
    code TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    academic_year_id INTEGER NOT NULL REFERENCES academic_years(id) ON DELETE CASCADE,
    semester_id INTEGER NOT NULL REFERENCES semesters(id) ON DELETE CASCADE,
    year_of_study INTEGER NOT NULL CHECK (year_of_study BETWEEN 1 AND 5),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    UNIQUE (student_id, academic_year_id, semester_id)
);

CREATE TABLE IF NOT EXISTS student_course_units (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    access_number TEXT NOT NULL REFERENCES access_numbers(code) ON DELETE CASCADE,
    course_unit_code TEXT NOT NULL,
    status TEXT,
    UNIQUE (access_number, course_unit_code)
);

CREATE TABLE IF NOT EXISTS student_course_works (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    access_number TEXT NOT NULL REFERENCES access_numbers(code) ON DELETE CASCADE,
    title TEXT NOT NULL,
    status TEXT,
    score INTEGER,
    submitted_on TEXT,
    UNIQUE (access_number, title)
);

CREATE TABLE IF NOT EXISTS student_associations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    access_number TEXT NOT NULL REFERENCES access_numbers(code) ON DELETE CASCADE,
    association_name TEXT NOT NULL,
    status TEXT NOT NULL,
    joined_on TEXT NOT NULL,
    UNIQUE (access_number, association_name)
);

CREATE TABLE IF NOT EXISTS internships (
    access_number TEXT PRIMARY KEY REFERENCES access_numbers(code) ON DELETE CASCADE,
    status TEXT NOT NULL,
    company_name TEXT,
    supervisor_name TEXT,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS approval_processes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    subject_kind TEXT NOT NULL,
    subject_ref TEXT NOT NULL,
    student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    access_number TEXT REFERENCES access_numbers(code) ON DELETE CASCADE,
    requirements_met INTEGER,
    created_at INTEGER NOT NULL,
    UNIQUE (kind, subject_kind, subject_ref)
);

CREATE TABLE IF NOT EXISTS approval_stages (
    process_id INTEGER NOT NULL REFERENCES approval_processes(id) ON DELETE CASCADE,
    stage TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    officer_name TEXT,
    officer_designation TEXT,
    officer_department TEXT,
    completed_on TEXT,
    signature_ref TEXT,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (process_id, stage)
);

CREATE TABLE IF NOT EXISTS checklist_items (
    process_id INTEGER NOT NULL REFERENCES approval_processes(id) ON DELETE CASCADE,
    item TEXT NOT NULL,
    received INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (process_id, item)
);

CREATE TABLE IF NOT EXISTS dead_semester_applications (
    process_id INTEGER PRIMARY KEY REFERENCES approval_processes(id) ON DELETE CASCADE,
    application_type TEXT NOT NULL,
    target_number INTEGER NOT NULL,
    reason TEXT NOT NULL,
    applied_on TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resumption_applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dead_semester_process_id INTEGER NOT NULL UNIQUE
        REFERENCES approval_processes(id) ON DELETE CASCADE,
    resume_semester INTEGER NOT NULL,
    resume_year INTEGER NOT NULL,
    reason TEXT NOT NULL,
    applied_on TEXT NOT NULL,
    approved INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_access_numbers_semester
    ON access_numbers(semester_id);
CREATE INDEX IF NOT EXISTS idx_approval_processes_student
    ON approval_processes(student_id, kind);
";
