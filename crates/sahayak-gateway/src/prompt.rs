//! Deterministic prompt construction.
//!
//! Every builder here is a pure function of its inputs: no clock, no
//! randomness, no I/O. The topic templates are written in the target language
//! and repeat the "this language only" constraint at the start, in the
//! numbered instructions and at the end.

use sahayak_assessment::FluencyReport;
use sahayak_visual::{title_case, SubjectTheme, VisualStyle};

use crate::request::{GradeBand, Language, RequestDescriptor};

/// Values substituted into a topic template.
struct Slots<'a> {
    subject: &'a str,
    grade: u8,
    topic: &'a str,
    kind: &'a str,
    min: u32,
    max: u32,
    directive: &'static str,
}

/// Builds the generation prompt for `descriptor`.
///
/// Never fails: unknown grades use the grade 3 directive, unknown lengths the
/// medium word band and unknown languages the generic template.
///
/// ```
/// use sahayak_gateway::{prompt, RequestDescriptor};
///
/// let text = prompt::build(&RequestDescriptor::new("Photosynthesis").with_language("hi"));
/// assert!(text.contains("केवल हिंदी"));
/// assert!(text.contains("Photosynthesis"));
/// ```
#[must_use]
pub fn build(descriptor: &RequestDescriptor) -> String {
    let grade = descriptor.grade();
    let (min, max) = descriptor.length.word_band();
    let slots = Slots {
        subject: descriptor.subject_or_default(),
        grade: grade.number(),
        topic: descriptor.topic.trim(),
        kind: descriptor.content_type.as_str(),
        min,
        max,
        directive: grade.directive(),
    };
    template(&descriptor.language, &slots).trim().to_string()
}

#[allow(clippy::too_many_lines)]
fn template(language: &Language, slots: &Slots<'_>) -> String {
    let Slots {
        subject,
        grade,
        topic,
        kind,
        min,
        max,
        directive,
    } = *slots;

    match language {
        Language::Hindi => format!(
            "
अत्यंत महत्वपूर्ण निर्देश: आपको केवल और केवल हिंदी में उत्तर देना है। एक भी अंग्रेजी शब्द का प्रयोग न करें।

ABSOLUTELY NO ENGLISH WORDS ALLOWED. HINDI ONLY. देवनागरी में लिखें।

विषय: {subject}
कक्षा: {grade}
प्रश्न/टॉपिक: {topic}
प्रकार: {kind}
शब्द सीमा: {min}-{max} शब्द

निर्देश:
1. केवल हिंदी भाषा में लिखें - कोई अंग्रेजी नहीं
2. {min}-{max} शब्दों में ही उत्तर दें
3. कक्षा {grade} के अनुसार शब्दावली का प्रयोग करें
4. {directive}

महत्वपूर्ण: पूरा उत्तर केवल हिंदी में दें। अंग्रेजी का एक भी शब्द न लिखें।

अब '{topic}' के बारे में हिंदी में {kind} लिखें:
"
        ),
        Language::Marathi => format!(
            "
अत्यंत महत्त्वाची सूचना: तुम्हाला फक्त आणि फक्त मराठीत उत्तर द्यायचे आहे. एकही इंग्रजी शब्द वापरू नका.

ABSOLUTELY NO ENGLISH WORDS ALLOWED. MARATHI ONLY. देवनागरीत लिहा.

विषय: {subject}
इयत्ता: {grade}
प्रश्न/विषय: {topic}
प्रकार: {kind}
शब्द मर्यादा: {min}-{max} शब्द

सूचना:
1. फक्त मराठी भाषेत लिहा - इंग्रजी नको
2. {min}-{max} शब्दांत उत्तर द्या
3. इयत्ता {grade} नुसार शब्दसंग्रह वापरा
4. {directive}

महत्त्वाचे: संपूर्ण उत्तर फक्त मराठीत द्या. इंग्रजीचा एकही शब्द लिहू नका.

आता '{topic}' बद्दल मराठीत {kind} लिहा:
"
        ),
        Language::Bengali => format!(
            "
অত্যন্ত গুরুত্বপূর্ণ নির্দেশনা: আপনাকে কেবলমাত্র বাংলায় উত্তর দিতে হবে। একটি ইংরেজি শব্দও ব্যবহার করবেন না।

ABSOLUTELY NO ENGLISH WORDS ALLOWED. BENGALI ONLY. বাংলায় লিখুন।

বিষয়: {subject}
শ্রেণী: {grade}
প্রশ্ন/বিষয়: {topic}
ধরন: {kind}
শব্দ সীমা: {min}-{max} শব্দ

নির্দেশনা:
1. কেবল বাংলা ভাষায় লিখুন - কোন ইংরেজি নয়
2. {min}-{max} শব্দে উত্তর দিন
3. শ্রেণী {grade} অনুযায়ী শব্দভাণ্ডার ব্যবহার করুন
4. {directive}

গুরুত্বপূর্ণ: সম্পূর্ণ উত্তর কেবল বাংলায় দিন। ইংরেজির একটি শব্দও লিখবেন না।

এখন '{topic}' সম্পর্কে বাংলায় {kind} লিখুন:
"
        ),
        Language::Telugu => format!(
            "
అత్యంత ముఖ్యమైన సూచనలు: మీరు కేవలం తెలుగులో మాత్రమే సమాధానం ఇవ్వాలి. ఒక్క ఇంగ్లీష్ పదం కూడా వాడకండి.

ABSOLUTELY NO ENGLISH WORDS ALLOWED. TELUGU ONLY. తెలుగులో రాయండి.

విషయం: {subject}
తరగతి: {grade}
ప్రశ్న/విషయం: {topic}
రకం: {kind}
పదాల పరిమితి: {min}-{max} పదాలు

సూచనలు:
1. కేవలం తెలుగు భాషలో రాయండి - ఇంగ్లీష్ వద్దు
2. {min}-{max} పదాలలో సమాధానం ఇవ్వండి
3. తరగతి {grade} అనుసారం పదజాలం వాడండి
4. {directive}

ముఖ్యం: మొత్తం సమాధానం కేవలం తెలుగులో ఇవ్వండి. ఇంగ్లీష్ పదం రాయకండి.

ఇప్పుడు '{topic}' గురించి తెలుగులో {kind} రాయండి:
"
        ),
        Language::Tamil => format!(
            "
மிக முக்கியமான அறிவுறுத்தல்கள்: நீங்கள் தமிழில் மட்டுமே பதிலளிக்க வேண்டும். ஒரு ஆங்கில வார்த்தையும் பயன்படுத்த வேண்டாம்.

ABSOLUTELY NO ENGLISH WORDS ALLOWED. TAMIL ONLY. தமிழில் எழுதுங்கள்.

பாடம்: {subject}
வகுப்பு: {grade}
கேள்வி/தலைப்பு: {topic}
வகை: {kind}
வார்த்தை வரம்பு: {min}-{max} வார்த்தைகள்

அறிவுறுத்தல்கள்:
1. தமிழ் மொழியில் மட்டுமே எழுதுங்கள் - ஆங்கிலம் வேண்டாம்
2. {min}-{max} வார்த்தைகளில் பதிலளியுங்கள்
3. வகுப்பு {grade} அளவுக்கு ஏற்ற சொற்களைப் பயன்படுத்துங்கள்
4. {directive}

முக்கியம்: முழு பதிலும் தமிழில் மட்டுமே தருங்கள். ஆங்கில வார்த்தை எழுத வேண்டாம்.

இப்போது '{topic}' பற்றி தமிழில் {kind} எழுதுங்கள்:
"
        ),
        Language::Gujarati => format!(
            "
અત્યંત મહત્વપૂર્ણ સૂચનાઓ: તમારે ફક્ત ગુજરાતીમાં જ જવાબ આપવાનો છે. એક પણ અંગ્રેજી શબ્દ વાપરશો નહીં.

ABSOLUTELY NO ENGLISH WORDS ALLOWED. GUJARATI ONLY. ગુજરાતીમાં લખો.

વિષય: {subject}
ધોરણ: {grade}
પ્રશ્ન/વિષય: {topic}
પ્રકાર: {kind}
શબ્દ મર્યાદા: {min}-{max} શબ્દો

સૂચનાઓ:
1. ફક્ત ગુજરાતી ભાષામાં લખો - અંગ્રેજી નહીં
2. {min}-{max} શબ્દોમાં જવાબ આપો
3. ધોરણ {grade} અનુસાર શબ્દભંડોળ વાપરો
4. {directive}

મહત્વપૂર્ણ: સંપૂર્ણ જવાબ ફક્ત ગુજરાતીમાં આપો. અંગ્રેજીનો એક પણ શબ્દ લખશો નહીં.

હવે '{topic}' વિશે ગુજરાતીમાં {kind} લખો:
"
        ),
        Language::Kannada => format!(
            "
ಅತ್ಯಂತ ಮುಖ್ಯ ಸೂಚನೆ: ನೀವು ಕೇವಲ ಕನ್ನಡದಲ್ಲಿ ಮಾತ್ರ ಉತ್ತರಿಸಬೇಕು. ಒಂದೇ ಒಂದು ಇಂಗ್ಲಿಷ್ ಪದವನ್ನೂ ಬಳಸಬೇಡಿ.

ABSOLUTELY NO ENGLISH WORDS ALLOWED. KANNADA ONLY. ಕನ್ನಡದಲ್ಲಿ ಬರೆಯಿರಿ.

ವಿಷಯ: {subject}
ತರಗತಿ: {grade}
ಪ್ರಶ್ನೆ/ವಿಷಯ: {topic}
ಪ್ರಕಾರ: {kind}
ಪದ ಮಿತಿ: {min}-{max} ಪದಗಳು

ಸೂಚನೆಗಳು:
1. ಕೇವಲ ಕನ್ನಡ ಭಾಷೆಯಲ್ಲಿ ಬರೆಯಿರಿ - ಇಂಗ್ಲಿಷ್ ಬೇಡ
2. {min}-{max} ಪದಗಳಲ್ಲಿ ಉತ್ತರಿಸಿ
3. ತರಗತಿ {grade} ಗೆ ತಕ್ಕ ಪದಗಳನ್ನು ಬಳಸಿ
4. {directive}

ಮುಖ್ಯ: ಸಂಪೂರ್ಣ ಉತ್ತರವನ್ನು ಕೇವಲ ಕನ್ನಡದಲ್ಲಿ ನೀಡಿ. ಇಂಗ್ಲಿಷ್ ಪದವನ್ನು ಬರೆಯಬೇಡಿ.

ಈಗ '{topic}' ಬಗ್ಗೆ ಕನ್ನಡದಲ್ಲಿ {kind} ಬರೆಯಿರಿ:
"
        ),
        Language::Malayalam => format!(
            "
അതീവ പ്രധാനമായ നിർദ്ദേശം: നിങ്ങൾ മലയാളത്തിൽ മാത്രമേ ഉത്തരം നൽകാവൂ. ഒരു ഇംഗ്ലീഷ് വാക്ക് പോലും ഉപയോഗിക്കരുത്.

ABSOLUTELY NO ENGLISH WORDS ALLOWED. MALAYALAM ONLY. മലയാളത്തിൽ എഴുതുക.

വിഷയം: {subject}
ക്ലാസ്: {grade}
ചോദ്യം/വിഷയം: {topic}
തരം: {kind}
വാക്ക് പരിധി: {min}-{max} വാക്കുകൾ

നിർദ്ദേശങ്ങൾ:
1. മലയാള ഭാഷയിൽ മാത്രം എഴുതുക - ഇംഗ്ലീഷ് വേണ്ട
2. {min}-{max} വാക്കുകളിൽ ഉത്തരം നൽകുക
3. ക്ലാസ് {grade} ന് അനുയോജ്യമായ പദങ്ങൾ ഉപയോഗിക്കുക
4. {directive}

പ്രധാനം: മുഴുവൻ ഉത്തരവും മലയാളത്തിൽ മാത്രം നൽകുക. ഒരു ഇംഗ്ലീഷ് വാക്കും എഴുതരുത്.

ഇപ്പോൾ '{topic}' നെക്കുറിച്ച് മലയാളത്തിൽ {kind} എഴുതുക:
"
        ),
        Language::Urdu => format!(
            "
انتہائی اہم ہدایت: آپ کو صرف اور صرف اردو میں جواب دینا ہے۔ ایک بھی انگریزی لفظ استعمال نہ کریں۔

ABSOLUTELY NO ENGLISH WORDS ALLOWED. URDU ONLY. اردو میں لکھیں۔

مضمون: {subject}
جماعت: {grade}
سوال/موضوع: {topic}
قسم: {kind}
الفاظ کی حد: {min}-{max} الفاظ

ہدایات:
1. صرف اردو زبان میں لکھیں - کوئی انگریزی نہیں
2. {min}-{max} الفاظ میں جواب دیں
3. جماعت {grade} کے مطابق الفاظ استعمال کریں
4. {directive}

اہم: پورا جواب صرف اردو میں دیں۔ انگریزی کا ایک بھی لفظ نہ لکھیں۔

اب '{topic}' کے بارے میں اردو میں {kind} لکھیں:
"
        ),
        Language::English => format!(
            "
IMPORTANT: Respond ONLY in English. Do not use words from any other language.

LANGUAGE: ENGLISH ONLY.

Subject: {subject}
Grade: {grade}
Topic: {topic}
Type: {kind}
Word limit: {min}-{max} words

Instructions:
1. Write only in English - no other language
2. Answer in {min}-{max} words
3. Use vocabulary suitable for grade {grade}
4. {directive}

IMPORTANT: Your entire response must be in English. Do not switch to any other language.

Now write {kind} about '{topic}' in English:
"
        ),
        Language::Other(code) => {
            let code = code.to_uppercase();
            format!(
                "
ULTRA CRITICAL LANGUAGE ENFORCEMENT
LANGUAGE: {code} ONLY
ABSOLUTELY NO ENGLISH OR OTHER LANGUAGES ALLOWED!

You MUST respond ONLY in {code} language. Do NOT use English or any other language.

Subject: {subject}
Grade: {grade}
Topic: {topic}
Type: {kind}
Word limit: {min}-{max} words EXACTLY

STRICT REQUIREMENTS:
1. Language: {code} ONLY (zero English words allowed)
2. Word count: {min}-{max} words (count each word carefully)
3. Grade {grade} appropriate vocabulary and concepts
4. {directive}

CRITICAL: Your entire response must be in {code} language. Count words carefully and stay within {min}-{max} words limit.

Now write {kind} about '{topic}' in {code} language:
"
            )
        }
    }
}

/// Asks for 2-3 sentences of encouraging feedback on a read-aloud attempt.
#[must_use]
pub fn reading_feedback(
    grade: GradeBand,
    language: &Language,
    original_text: &str,
    transcription: &str,
    report: &FluencyReport,
) -> String {
    let language = language.english_name();
    format!(
        "Analyze this reading assessment for a Grade {grade} student:

Original Text: {original}
Student's Reading (transcribed): {transcription}
Language: {language}

Basic Analysis:
- Accuracy: {accuracy:.1}%
- Correct Words: {correct}/{total}

Please provide specific, constructive feedback in {language} that:
1. Acknowledges what the student did well
2. Identifies specific areas for improvement
3. Gives practical tips for better reading
4. Is encouraging and age-appropriate for grade {grade}

Keep the feedback concise but helpful (2-3 sentences).",
        original = original_text.trim(),
        transcription = transcription.trim(),
        accuracy = report.accuracy_percent,
        correct = report.correct_word_count,
        total = report.total_word_count,
    )
}

/// Sentence complexity requested for a reading passage.
const fn passage_complexity(grade: GradeBand) -> &'static str {
    match grade {
        GradeBand::One => "very simple sentences with 3-5 words each",
        GradeBand::Two => "simple sentences with basic vocabulary",
        GradeBand::Three => "moderate sentences with elementary vocabulary",
        GradeBand::Four => "compound sentences with intermediate vocabulary",
        GradeBand::Five => "complex sentences with advanced elementary vocabulary",
    }
}

/// Asks for a read-aloud passage.
///
/// `difficulty` is `easy`, `medium` or `hard` and `word_limit` is `short`,
/// `medium` or `long`; anything else means medium.
#[must_use]
pub fn reading_passage(
    grade: GradeBand,
    difficulty: &str,
    word_limit: &str,
    language: &Language,
) -> String {
    let difficulty = match difficulty.trim().to_lowercase().as_str() {
        "easy" => "simple and repetitive",
        "hard" => "appropriately challenging",
        _ => "moderately challenging",
    };
    let target = match word_limit.trim().to_lowercase().as_str() {
        "short" => "50-100 words",
        "long" => "150-200 words",
        _ => "100-150 words",
    };
    let language = language.english_name();
    let complexity = passage_complexity(grade);

    format!(
        "Generate a {difficulty} reading passage for Grade {grade} students in {language}.

Requirements:
- Use {complexity}
- Length: {target}
- Educational content (science, nature, friendship, family values)
- Include Indian cultural context and familiar scenarios
- Make it engaging and age-appropriate
- Use proper grammar and punctuation
- Write completely in {language}, using its own script

Create a story or informational text that would be interesting for children to read aloud."
    )
}

/// Asks for a 5-8 exercise worksheet.
///
/// With `from_image` the model is told to base the questions on an attached
/// textbook page.
#[must_use]
pub fn worksheet(
    grade: &str,
    subject: &str,
    topic: Option<&str>,
    language: &Language,
    from_image: bool,
) -> String {
    let grade = grade.trim();
    let language = language.english_name();
    let focus = topic
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(|topic| format!(" on the topic '{topic}'"))
        .unwrap_or_default();

    let (opening, question_types, source_line) = if from_image {
        (
            format!("Based on the textbook page image provided, create a worksheet for grade {grade} students in {subject}{focus}."),
            "fill-in-the-blank, short answer, match the following",
            "\n- Ensure questions are based on the content visible in the image",
        )
    } else {
        (
            format!("Create a worksheet for grade {grade} students in {subject}{focus}."),
            "fill-in-the-blank, short answer, multiple choice",
            "",
        )
    };

    format!(
        "{opening}

Requirements:
- Adapt the difficulty level for grade {grade}
- Include 5-8 questions/exercises
- Mix different question types ({question_types}){source_line}
- Make it appropriate for Indian curriculum standards
- Include clear instructions for students
- Write the worksheet in {language}

Grade Level: {grade}
Subject: {subject}

Format the output as a ready-to-use worksheet."
    )
}

/// Heading placed above each generated worksheet.
///
/// ```
/// let header = sahayak_gateway::prompt::worksheet_header("4", "Science");
/// assert!(header.starts_with("Grade 4 Worksheet - Science\n====="));
/// ```
#[must_use]
pub fn worksheet_header(grade: &str, subject: &str) -> String {
    format!(
        "Grade {} Worksheet - {}\n{}\n\n",
        grade.trim(),
        subject.trim(),
        "=".repeat(50)
    )
}

/// Asks for an illustrator-ready description of an educational visual.
#[must_use]
pub fn visual_description(prompt: &str, style: &str, subject: &str) -> String {
    let lead = VisualStyle::from_name(style).map_or(
        "Create a detailed description for an educational visual",
        VisualStyle::description_lead,
    );
    let context = SubjectTheme::from_name(subject).description_context();
    let style_title = if style.trim().is_empty() {
        "Illustration".to_string()
    } else {
        title_case(style.trim())
    };
    let subject_title = if subject.trim().is_empty() {
        "General".to_string()
    } else {
        title_case(subject.trim())
    };
    let prompt = prompt.trim();

    format!(
        "{lead} about: {prompt}

Requirements:
- {context}
- Suitable for elementary/primary school students
- Educationally valuable and engaging
- Clear, bright, and visually appealing
- Include specific visual elements that would help students understand the concept
- Describe colors, layout, and key components
- Appropriate for Indian educational context

Style: {style_title}
Subject: {subject_title}
Topic: {prompt}

Provide a detailed visual description that an illustrator could use to create the actual image."
    )
}
