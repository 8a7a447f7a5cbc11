use super::SchemaDescriptor;
use crate::models::{MeetingInfo, truncate_chars};

/// Persona for the narrative call
pub const MEETING_SYSTEM_PROMPT: &str = "Você é um especialista em análise de reuniões corporativas com background em psicologia organizacional, gestão de projetos e comunicação eficaz. Sua análise deve ser profunda, prática e baseada em evidências presentes na transcrição.";

/// Instructions and required headings for the narrative report
pub const MEETING_INSTRUCTIONS: &str = r#"INSTRUÇÕES PARA ANÁLISE:

1. IDENTIFIQUE OS PARTICIPANTES: nomes, cargos estimados pelo contexto e nível de participação.
2. ANALISE O CONTEÚDO: tópicos, decisões, ações acordadas (com responsáveis e prazos), conflitos e momentos-chave.
3. ANALISE CADA PARTICIPANTE: participação, tom, colaboração, clareza, liderança, sinais de estresse ou satisfação, influência nas decisões.
4. APONTE RED FLAGS: comunicação ineficaz, responsabilidades vagas, conflitos não resolvidos, desalinhamento, falta de preparação, dominação da conversa.
5. AVALIE A EFICÁCIA: objetivos atingidos, uso do tempo, participação equilibrada, decisões acionáveis, próximos passos definidos.
6. DÊ RECOMENDAÇÕES: pontos fortes, melhorias, treinamentos, ajustes de formato.
7. DÊ NOTAS DE 0 A 10: eficiência, satisfação estimada, qualidade das decisões e média final.

FORMATO DA RESPOSTA:

# RELATÓRIO DE ANÁLISE DE REUNIÃO
## 1. PARTICIPANTES IDENTIFICADOS
## 2. RESUMO DA REUNIÃO
## 3. DECISÕES E AÇÕES
## 4. ANÁLISE INDIVIDUAL POR PARTICIPANTE
## 5. RED FLAGS IDENTIFICADAS
## 6. INSIGHTS E RECOMENDAÇÕES
## 7. NOTA FINAL DA REUNIÃO
## 8. PRÓXIMOS PASSOS"#;

/// Persona for sales-call analysis
pub const SALES_SYSTEM_PROMPT: &str = "Você é um coach de vendas B2B especialista na metodologia SPIN Selling. Avalie a condução da chamada pelo vendedor com base apenas no que está na transcrição.";

pub const SALES_INSTRUCTIONS: &str = r#"INSTRUÇÕES PARA ANÁLISE:

1. Identifique vendedor(es) e cliente(s).
2. Avalie cada etapa SPIN (Situação, Problema, Implicação, Necessidade de solução) com exemplos literais.
3. Liste objeções do cliente e como foram tratadas.
4. Registre compromissos, próximos passos e prazos.
5. Dê recomendações práticas ao vendedor.

FORMATO DA RESPOSTA:

# RELATÓRIO DE ANÁLISE DE VENDAS
## 1. PARTICIPANTES
## 2. RESUMO DA CHAMADA
## 3. AVALIAÇÃO SPIN
## 4. OBJEÇÕES
## 5. COMPROMISSOS E PRÓXIMOS PASSOS
## 6. RECOMENDAÇÕES AO VENDEDOR"#;

/// System instruction for the structured-extraction call
pub const STRUCTURED_SYSTEM_PROMPT: &str = "Você extrai dados estruturados de reuniões. Responda somente com um objeto JSON válido, sem texto antes ou depois e sem blocos de código.";

/// Prompt texts injected into the pipeline
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub narrative_system: String,
    pub narrative_instructions: String,
    pub structured_system: String,
}

impl PromptTemplates {
    /// General corporate meeting analysis
    pub fn meeting() -> Self {
        Self {
            narrative_system: MEETING_SYSTEM_PROMPT.to_string(),
            narrative_instructions: MEETING_INSTRUCTIONS.to_string(),
            structured_system: STRUCTURED_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Sales call analysis with methodology scoring
    pub fn sales_call() -> Self {
        Self {
            narrative_system: SALES_SYSTEM_PROMPT.to_string(),
            narrative_instructions: SALES_INSTRUCTIONS.to_string(),
            structured_system: STRUCTURED_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::meeting()
    }
}

/// Build the prompt for the free-text narrative report
///
/// The reference-context section is left out entirely when `context_block`
/// is empty.
pub fn build_narrative_prompt(
    templates: &PromptTemplates,
    context_block: &str,
    transcript: &str,
    meeting_info: Option<&MeetingInfo>,
) -> String {
    let mut prompt = String::new();

    if let Some(info) = meeting_info.filter(|i| !i.is_empty()) {
        prompt.push_str("INFORMAÇÕES ADICIONAIS DA REUNIÃO:\n");
        prompt.push_str(&info.to_prompt_block());
        prompt.push('\n');
    }

    prompt.push_str(&templates.narrative_instructions);
    prompt.push_str("\n\n");

    if !context_block.is_empty() {
        prompt.push_str("CONTEXTO DE REFERÊNCIA (base de conhecimento):\n");
        prompt.push_str(context_block);
        prompt.push_str("\n\n");
    }

    prompt.push_str("TRANSCRIÇÃO DA REUNIÃO:\n");
    prompt.push_str(transcript);
    prompt.push('\n');

    prompt
}

/// Build the prompt for the schema-constrained extraction call
pub fn build_structured_prompt(
    schema: &SchemaDescriptor,
    narrative: &str,
    transcript: &str,
    context_block: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("Extraia da reunião abaixo os dados no formato JSON descrito.\n\n");
    prompt.push_str("REGRAS:\n");
    prompt.push_str("- Responda APENAS com o objeto JSON, sem texto antes ou depois.\n");
    prompt.push_str("- Inclua TODAS as chaves de nível superior, mesmo vazias ([] para listas).\n");
    prompt.push_str("- Use \"Não informado\" quando um valor não aparecer na reunião.\n");
    prompt.push_str("- Prazos: copie a expressão usada (ex.: \"até sexta-feira\"), sem converter em data.\n");
    prompt.push_str("- Em \"evidence\", copie um trecho literal da transcrição.\n");
    prompt.push_str("- Para quem, o quê e quando, prefira a TRANSCRIÇÃO literal à ANÁLISE PRÉVIA. Se as duas divergirem, confie na transcrição.\n\n");

    prompt.push_str(&schema.prompt_text());
    prompt.push_str("\n\n");

    if !context_block.is_empty() {
        prompt.push_str("CONTEXTO DE REFERÊNCIA:\n");
        prompt.push_str(context_block);
        prompt.push_str("\n\n");
    }

    prompt.push_str("TRANSCRIÇÃO:\n");
    prompt.push_str(transcript);
    prompt.push_str("\n\nANÁLISE PRÉVIA:\n");
    prompt.push_str(narrative);
    prompt.push('\n');

    prompt
}

/// Build the prompt asking for basic meeting facts as JSON
pub fn build_metadata_prompt(text: &str, max_chars: usize) -> String {
    format!(
        r#"Extraia informações básicas desta reunião:

{}

Procure por data, horário, participantes presentes, objetivo e tópicos principais.

Responda somente com JSON neste formato:
{{
    "date": "data encontrada ou desconhecida",
    "time": "horário encontrado ou desconhecido",
    "participants": ["lista de nomes"],
    "objective": "objetivo da reunião",
    "topics": ["lista de tópicos"]
}}"#,
        truncate_chars(text, max_chars)
    )
}

/// Build the prompt for a one-paragraph executive summary
pub fn build_summary_prompt(narrative: &str) -> String {
    format!(
        "Crie um resumo executivo de 1 parágrafo desta análise:\n\n{}",
        narrative
    )
}
