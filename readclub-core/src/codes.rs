use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Sentinel code for failures that carried no error envelope.
pub const UNKNOWN_CODE: &str = "UNKNOWN";

/// Shown when neither the registry nor the server has anything to say.
pub const FALLBACK_MESSAGE: &str = "알 수 없는 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.";

/// Business partition a code belongs to, derived from its alphabetic prefix.
/// `C` is the global partition, split by number range: `C0xx` generic,
/// `C1xx` authentication, `C2xx` upload, `C3xx` external integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    Global,
    User,
    Group,
    Meeting,
    Book,
    Review,
    Topic,
    Unknown,
}

impl ErrorDomain {
    pub fn of(code: &str) -> Self {
        let prefix: String = code.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        match prefix.as_str() {
            "C" => Self::Global,
            "U" => Self::User,
            "G" => Self::Group,
            "M" => Self::Meeting,
            "B" => Self::Book,
            "R" => Self::Review,
            "T" => Self::Topic,
            _ => Self::Unknown,
        }
    }
}

const GLOBAL: &[(&str, &str)] = &[
    ("C001", "서버 내부 오류가 발생했습니다."),
    ("C002", "입력값이 올바르지 않습니다."),
    ("C003", "허용되지 않은 요청 방식입니다."),
    ("C004", "요청한 리소스를 찾을 수 없습니다."),
    ("C005", "요청이 너무 많습니다. 잠시 후 다시 시도해 주세요."),
    ("C101", "로그인이 필요합니다."),
    ("C102", "접근 권한이 없습니다."),
    ("C103", "로그인이 만료되었습니다. 다시 로그인해 주세요."),
    ("C104", "유효하지 않은 인증 정보입니다."),
    ("C105", "소셜 로그인에 실패했습니다."),
    ("C201", "파일 크기가 너무 큽니다."),
    ("C202", "지원하지 않는 파일 형식입니다."),
    ("C203", "파일 업로드에 실패했습니다."),
    ("C301", "외부 서비스 호출에 실패했습니다."),
    ("C302", "도서 검색 서비스에 연결할 수 없습니다."),
    ("C303", "지도 서비스에 연결할 수 없습니다."),
];

const USER: &[(&str, &str)] = &[
    ("U001", "사용자를 찾을 수 없습니다."),
    ("U002", "이미 사용 중인 닉네임입니다."),
    ("U003", "이미 가입된 이메일입니다."),
    ("U004", "프로필 정보가 올바르지 않습니다."),
];

const GROUP: &[(&str, &str)] = &[
    ("G001", "모임을 찾을 수 없습니다."),
    ("G002", "이미 가입한 모임입니다."),
    ("G003", "모임 정원이 가득 찼습니다."),
    ("G004", "모임장만 수행할 수 있는 작업입니다."),
    ("G005", "모임 가입 신청을 찾을 수 없습니다."),
];

const MEETING: &[(&str, &str)] = &[
    ("M001", "모임 일정을 찾을 수 없습니다."),
    ("M002", "이미 참석 신청한 일정입니다."),
    ("M003", "참석 인원이 가득 찼습니다."),
    ("M004", "이미 종료된 일정입니다."),
];

const BOOK: &[(&str, &str)] = &[
    ("B001", "도서를 찾을 수 없습니다."),
    ("B002", "이미 등록된 도서입니다."),
];

const REVIEW: &[(&str, &str)] = &[
    ("R001", "리뷰를 찾을 수 없습니다."),
    ("R002", "이미 리뷰를 작성했습니다."),
    ("R003", "본인이 작성한 리뷰만 수정할 수 있습니다."),
];

const TOPIC: &[(&str, &str)] = &[
    ("T001", "토론 주제를 찾을 수 없습니다."),
    ("T002", "토론 주제를 작성할 권한이 없습니다."),
    ("T003", "이미 마감된 토론 주제입니다."),
];

/// Immutable code -> user message table built from every partition.
static REGISTRY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [GLOBAL, USER, GROUP, MEETING, BOOK, REVIEW, TOPIC]
        .into_iter()
        .flatten()
        .copied()
        .collect()
});

/// Look up the registered user message for `code`.
pub fn message_for(code: &str) -> Option<&'static str> {
    REGISTRY.get(code).copied()
}

pub fn is_registered(code: &str) -> bool {
    REGISTRY.contains_key(code)
}
