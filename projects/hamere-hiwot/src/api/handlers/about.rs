use axum::{extract::Query, Json};
use serde_json::{json, Value};
use crate::i18n::{translate, Language};
use super::LangQuery;

pub async fn get(Query(q): Query<LangQuery>) -> Json<Value> {
    let (name, summary) = match q.lang {
        Language::En => (
            "Hamere Hiwot Sunday School",
            "Sunday school of the Ethiopian Orthodox Tewahedo Church serving children and youth through spiritual education, choir and service.",
        ),
        Language::Am => (
            "ሐመረ ሕይወት ሰንበት ትምህርት ቤት",
            "በኢትዮጵያ ኦርቶዶክስ ተዋሕዶ ቤተ ክርስቲያን ሥር ሕፃናትንና ወጣቶችን በመንፈሳዊ ትምህርት፣ በመዝሙርና በአገልግሎት የሚያገለግል ሰንበት ትምህርት ቤት።",
        ),
    };
    let classes: Vec<Value> = ["qedamay", "kalay", "salsay", "rabay"]
        .iter()
        .map(|id| json!({ "id": id, "name": translate(q.lang, id) }))
        .collect();

    Json(json!({
        "name": name,
        "summary": summary,
        "classes": classes,
    }))
}
