//! `reply-strategy`: text or voice note, and how involved the answer is.
//!
//! There is no safe default channel, so a reply that is not exactly the
//! expected JSON fails the stage.

use serde::{Deserialize, Serialize};

use wv_domain::config::ROLE_STRATEGY;
use wv_domain::error::{Error, Result};
use wv_domain::trace::TraceEvent;
use wv_providers::{ChatMessage, ChatRequest};

use super::{load_history, PipelineContext};

const STRATEGY_MAX_TOKENS: u32 = 100;

const STRATEGY_INSTRUCTION: &str = r#"Fai parte del sistema Clonyo.
In input ricevi un’intera conversazione in stile WhatsApp (sequenza di messaggi con {role: user|assistant, content}).
Il tuo compito è analizzare l’ultimo messaggio dell’utente tenendo conto del contesto della conversazione e restituire un JSON con due campi:

{
  "complexity_factor": <float compreso tra 0 e 1>,
  "mode": "<text|audio>"
}

Output:
- Usa valori rappresentativi (0.1, 0.3, 0.5, 0.8, 1.0) o intermedi quando necessario.
- Restituisci **solo JSON**, nessun testo aggiuntivo.

Regole principali:
1. Se l’utente chiede esplicitamente un “audio” o “voce” (in qualunque lingua) → mode="audio".
2. Se l’utente chiede esplicitamente “testo”, “messaggio” o “scrivi” (in qualunque lingua) → mode="text".
3. Altrimenti valuta in base a TEMA × TIPO_DI_DOMANDA × CONTESTO.

Temi principali (esempi, non esaustivi):
- SMALL_TALK: saluti, ringraziamenti, conferme brevi.
- INFO_LOOKUP: “dove trovo…”, “link”, titoli di libri/podcast/risorse.
- FINANZA/TECNOLOGIA: investimenti, ETF, Bitcoin, asset allocation, istruzioni tecniche.
- CONSIGLIO_PERSONALE: scelte di vita, relazioni, genitorialità.
- SALUTE/COMPORTAMENTO: abitudini, tic nervosi, benessere psicologico.
- LAVORO_VALORI: direzioni di carriera, scelte basate su valori personali.

Tipi di domanda:
- FACT_LOOKUP: recupero semplice di informazione.
- CONFRONTO_SEMPLICE: A/B breve (“ETF o azioni?”).
- HOWTO_BREVE: pochi passi, istruzioni snelle.
- HOWTO_DETTAGLIATO: procedura articolata.
- STRATEGIA_FRAMEWORK: ragionamento lungo, strutturato e personalizzato.
- CONSIGLIO_EMOTIVO: richiesta di supporto sensibile.

Contesto conversazionale:
- Considera il tono e la profondità della conversazione recente.
- Aumenta il complexity_factor quando l’utente chiede guida strutturata, personalizzazione o strategia.
- Riducilo quando chiede semplici conferme, link o informazioni brevi.

Euristiche:
- SMALL_TALK → mode="text", complexity_factor=0.1.
- INFO_LOOKUP (es. “dove trovo un libro/podcast?”) → mode="text", complexity_factor=0.2–0.3.
- FINANZA/TECNOLOGIA:
  - domanda tecnica posta in modo tecnico → mode="audio", complexity_factor=0.8–1.0.
  - richiesta di consiglio/sintesi pratica → mode="audio", complexity_factor=0.6–0.8.
  - confronto semplice (es. “ETF o azioni?” poco contestualizzato) → mode="text", complexity_factor=0.3–0.5.
- CONSIGLIO_PERSONALE o SALUTE/COMPORTAMENTO → preferisci mode="audio":
  - temi emotivi/sensibili → complexity_factor=0.8–1.0.
- LAVORO_VALORI → spesso meglio audio, complexity_factor=0.7–0.9.
- Se l’utente scrive follow-up brevi (“Ok”, “Grazie”, “Si grazie”) → mode="text", complexity_factor=0.1–0.2."#;

#[derive(Debug, Deserialize)]
pub struct StrategyInput {
    #[serde(rename = "userInput")]
    pub user_input: String,
    #[serde(default)]
    pub messages_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    Text,
    Audio,
}

impl ReplyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyMode::Text => "text",
            ReplyMode::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplyDecision {
    pub complexity_factor: f64,
    pub mode: ReplyMode,
}

pub async fn select_reply_strategy(
    ctx: &PipelineContext,
    input: StrategyInput,
) -> Result<ReplyDecision> {
    let mut messages = load_history(ctx, &input.messages_key).await?;
    messages.push(ChatMessage::user(input.user_input));

    let model = ctx.llm.for_role(ROLE_STRATEGY)?;
    let req = ChatRequest {
        system: Some(STRATEGY_INSTRUCTION.into()),
        messages,
        temperature: Some(0.0),
        max_tokens: Some(STRATEGY_MAX_TOKENS),
        model: None,
    };
    let resp = model.chat(req, ctx.sink.as_ref()).await?;
    let decision = parse_decision(&resp.content)?;

    ctx.sink.record(TraceEvent::ReplyStrategySelected {
        mode: decision.mode.as_str().into(),
        complexity_factor: decision.complexity_factor,
    });
    Ok(decision)
}

/// Strict parse of the classifier reply; the factor is clamped to `[0, 1]`.
pub fn parse_decision(text: &str) -> Result<ReplyDecision> {
    let mut decision: ReplyDecision = serde_json::from_str(text.trim())
        .map_err(|e| Error::Parse(format!("reply strategy: {e}: {text}")))?;
    if !decision.complexity_factor.is_finite() {
        return Err(Error::Parse(format!(
            "reply strategy: complexity_factor is not a number: {text}"
        )));
    }
    decision.complexity_factor = decision.complexity_factor.clamp(0.0, 1.0);
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_json() {
        let d = parse_decision(r#"{"complexity_factor": 0.15, "mode": "text"}"#).unwrap();
        assert_eq!(d.mode, ReplyMode::Text);
        assert!((d.complexity_factor - 0.15).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_factor_is_clamped() {
        let d = parse_decision(r#"{"complexity_factor": 1.7, "mode": "audio"}"#).unwrap();
        assert_eq!(d.complexity_factor, 1.0);
        let d = parse_decision(r#"{"complexity_factor": -2, "mode": "audio"}"#).unwrap();
        assert_eq!(d.complexity_factor, 0.0);
    }

    #[test]
    fn prose_and_unknown_modes_are_parse_errors() {
        assert!(matches!(
            parse_decision("Direi audio."),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_decision(r#"{"complexity_factor": 0.5, "mode": "video"}"#),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_decision(r#"{"mode": "text"}"#),
            Err(Error::Parse(_))
        ));
    }
}
